use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, Member, MemberId, ResultEngine, members,
    util::{normalize_email, normalize_required_text},
};

use super::{Engine, with_tx};

impl Engine {
    /// Registers a new member.
    ///
    /// The email, when given, is lowercased and must be unique.
    pub async fn new_member(&self, name: &str, email: Option<&str>) -> ResultEngine<Member> {
        let name = normalize_required_text(name, "member name")?;
        let email = email.map(normalize_email).transpose()?;
        let member = with_tx!(self, |db_tx| {
            self.insert_member(&db_tx, name, email, true).await
        })?;
        tracing::info!(member_id = member.id, "member created");
        Ok(member)
    }

    pub async fn member(&self, member_id: MemberId) -> ResultEngine<Member> {
        with_tx!(self, |db_tx| {
            let model = self.require_member_row(&db_tx, member_id).await?;
            Ok(Member::from(model))
        })
    }

    /// Changes the display name, the only mutable attribute of a member.
    pub async fn rename_member(&self, member_id: MemberId, name: &str) -> ResultEngine<Member> {
        let name = normalize_required_text(name, "member name")?;
        with_tx!(self, |db_tx| {
            self.require_member_row(&db_tx, member_id).await?;
            let active = members::ActiveModel {
                id: ActiveValue::Set(member_id),
                name: ActiveValue::Set(name),
                ..Default::default()
            };
            let model = active.update(&db_tx).await?;
            Ok(Member::from(model))
        })
    }

    /// All members, ascending by id.
    pub async fn list_members(&self) -> ResultEngine<Vec<Member>> {
        with_tx!(self, |db_tx| {
            let rows = members::Entity::find()
                .order_by_asc(members::Column::Id)
                .all(&db_tx)
                .await?;
            Ok(rows.into_iter().map(Member::from).collect())
        })
    }

    pub(super) async fn insert_member(
        &self,
        db: &DatabaseTransaction,
        name: String,
        email: Option<String>,
        registered: bool,
    ) -> ResultEngine<Member> {
        if let Some(email) = email.as_deref() {
            let exists = members::Entity::find()
                .filter(members::Column::Email.eq(email))
                .one(db)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(email.to_string()));
            }
        }

        let active = members::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(name),
            email: ActiveValue::Set(email),
            registered: ActiveValue::Set(registered),
            created_at: ActiveValue::Set(Utc::now()),
        };
        let model = active.insert(db).await?;
        Ok(Member::from(model))
    }
}
