use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::{
    Group, MemberId, ResultEngine,
    notifier::{ConnectError, IdentityVerifier, MembershipLookup, Notifier, Session},
};

mod access;
mod balances;
mod expenses;
mod groups;
mod history;
mod members;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result: ResultEngine<_> = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    notifier: Arc<Notifier>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// The notifier group mutations are pushed to.
    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    /// Opens a real-time session for the holder of `credential`, subscribed
    /// to the rooms of every group the member belongs to.
    pub async fn connect_session(
        &self,
        credential: &str,
        verifier: &dyn IdentityVerifier,
    ) -> Result<Session, ConnectError> {
        self.notifier.connect(credential, verifier, self).await
    }

    pub fn disconnect_session(&self, session: &mut Session) {
        self.notifier.disconnect(session);
    }
}

#[async_trait]
impl MembershipLookup for Engine {
    async fn groups_for_member(&self, member_id: MemberId) -> ResultEngine<Vec<Group>> {
        Engine::groups_for_member(self, member_id).await
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    notifier: Option<Arc<Notifier>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Share an existing notifier. A default one is created otherwise.
    pub fn notifier(mut self, notifier: Arc<Notifier>) -> EngineBuilder {
        self.notifier = Some(notifier);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            notifier: self.notifier.unwrap_or_default(),
        })
    }
}
