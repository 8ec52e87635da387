//! Real-time membership notifications.
//!
//! The [`Notifier`] keeps an explicit registry of connected sessions and of
//! the group rooms they are subscribed to, and fans events out to them.
//! Room membership is a cache of the ledger: it is rebuilt from
//! [`MembershipLookup`] when a session connects and patched by the engine
//! after every group mutation.
//!
//! A session moves through `Connecting -> Authenticated -> Subscribed ->
//! Disconnected`. Credential checks are delegated to an [`IdentityVerifier`]
//! and must fail fast; the membership lookup is bounded by the notifier's
//! connect timeout.
//!
//! Delivery is best-effort: only currently connected sessions receive an
//! event, and sending to a closed session or an empty room is a silent
//! no-op.

use std::{
    sync::{PoisonError, RwLock},
    time::Duration,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, error::TryRecvError};
use uuid::Uuid;

use crate::{EngineError, Group, GroupId, MemberId, ResultEngine};

mod rooms;

use rooms::Rooms;

pub const INIT_GROUPS: &str = "INIT_GROUPS";
pub const GROUP_CREATED: &str = "GROUP_CREATED";
pub const ADDED_TO_GROUP: &str = "ADDED_TO_GROUP";
pub const UNAUTHORIZED: &str = "unauthorized";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub type SessionId = Uuid;

/// Event envelope delivered to sessions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutboundEvent {
    pub event: String,
    pub payload: serde_json::Value,
}

impl OutboundEvent {
    pub fn new(event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticated,
    Subscribed,
    Disconnected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnauthorizedReason {
    Invalid,
    Expired,
}

impl UnauthorizedReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invalid => "invalid_token",
            Self::Expired => "jwt_expired",
        }
    }
}

/// Failure reported by an [`IdentityVerifier`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("credential has expired")]
    Expired,
    #[error("invalid credential: {0}")]
    Invalid(String),
}

/// Resolves a bearer credential to a member id.
///
/// Implementations must not block: verification is a local check (signature,
/// expiry), never a network round trip.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, credential: &str) -> Result<MemberId, VerifyError>;
}

/// The only ledger capability the notifier needs.
#[async_trait]
pub trait MembershipLookup: Send + Sync {
    async fn groups_for_member(&self, member_id: MemberId) -> ResultEngine<Vec<Group>>;
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("unauthorized: {}", .0.as_str())]
    Unauthorized(UnauthorizedReason),
    #[error("membership lookup timed out")]
    Timeout,
    #[error("membership lookup failed: {0}")]
    Lookup(#[from] EngineError),
}

impl ConnectError {
    /// Event to emit before closing the connection, if any.
    ///
    /// Only an expired credential gets a distinguishable notice.
    pub fn close_event(&self) -> Option<OutboundEvent> {
        match self {
            Self::Unauthorized(UnauthorizedReason::Expired) => Some(OutboundEvent::new(
                UNAUTHORIZED,
                serde_json::json!({ "reason": UnauthorizedReason::Expired.as_str() }),
            )),
            _ => None,
        }
    }
}

/// A connected session.
///
/// Events addressed to the session queue up in `events` until read.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    member_id: MemberId,
    state: SessionState,
    events: UnboundedReceiver<OutboundEvent>,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn member_id(&self) -> MemberId {
        self.member_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Waits for the next event; `None` once the session is disconnected.
    pub async fn recv(&mut self) -> Option<OutboundEvent> {
        self.events.recv().await
    }

    /// Returns a queued event without waiting.
    pub fn try_recv(&mut self) -> Option<OutboundEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

#[derive(Debug)]
pub struct Notifier {
    rooms: RwLock<Rooms>,
    connect_timeout: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl Notifier {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            rooms: RwLock::new(Rooms::default()),
            connect_timeout,
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Rooms> {
        self.rooms.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Rooms> {
        self.rooms.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Authenticates and subscribes a new session.
    ///
    /// On success the session is in its member's personal room and in one
    /// room per group the member belongs to. `INIT_GROUPS` is always the
    /// first queued event: anything addressed to the member while the
    /// membership lookup runs is held back and queued right after it.
    pub async fn connect(
        &self,
        credential: &str,
        verifier: &dyn IdentityVerifier,
        lookup: &dyn MembershipLookup,
    ) -> Result<Session, ConnectError> {
        let mut state = SessionState::Connecting;
        tracing::debug!(?state, "session handshake");

        let member_id = verifier.verify(credential).map_err(|err| {
            tracing::info!("rejecting session: {err}");
            ConnectError::Unauthorized(match err {
                VerifyError::Expired => UnauthorizedReason::Expired,
                VerifyError::Invalid(_) => UnauthorizedReason::Invalid,
            })
        })?;
        state = SessionState::Authenticated;
        tracing::debug!(?state, member_id, "credential verified");

        let session_id = Uuid::new_v4();
        let (sender, events) = mpsc::unbounded_channel();
        let (backlog_sender, mut backlog) = mpsc::unbounded_channel();
        self.write().register(session_id, member_id, backlog_sender);

        let groups = match tokio::time::timeout(
            self.connect_timeout,
            lookup.groups_for_member(member_id),
        )
        .await
        {
            Ok(Ok(groups)) => groups,
            Ok(Err(err)) => {
                self.write().unregister(session_id);
                return Err(ConnectError::Lookup(err));
            }
            Err(_) => {
                self.write().unregister(session_id);
                return Err(ConnectError::Timeout);
            }
        };

        {
            // no broadcast may interleave the snapshot and the backlog
            let mut rooms = self.write();
            for group in &groups {
                rooms.join_group(member_id, group.id);
            }
            if let Some(init) = encode(INIT_GROUPS, &groups) {
                let _ = sender.send(init);
            }
            while let Ok(event) = backlog.try_recv() {
                let _ = sender.send(event);
            }
            rooms.replace_sender(session_id, sender);
        }

        state = SessionState::Subscribed;
        tracing::info!(%session_id, member_id, groups = groups.len(), "session subscribed");

        Ok(Session {
            id: session_id,
            member_id,
            state,
            events,
        })
    }

    /// Tears a session down. Safe to call more than once.
    pub fn disconnect(&self, session: &mut Session) {
        if self.write().unregister(session.id) {
            tracing::info!(session_id = %session.id, member_id = session.member_id, "session disconnected");
        }
        session.state = SessionState::Disconnected;
        session.events.close();
    }

    /// Delivers to every session subscribed to the group's room.
    pub fn broadcast_to_group<T: Serialize + ?Sized>(&self, group_id: GroupId, event: &str, payload: &T) {
        let Some(event) = encode(event, payload) else {
            return;
        };
        let rooms = self.read();
        let mut delivered = 0usize;
        for member_id in rooms.group_members(group_id) {
            for (_, sender) in rooms.member_senders(member_id) {
                if sender.send(event.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }
        tracing::debug!(group_id, event = %event.event, delivered, "group broadcast");
    }

    /// Delivers to each member's personal room, regardless of group
    /// subscriptions.
    pub fn notify_members<T: Serialize + ?Sized>(&self, member_ids: &[MemberId], event: &str, payload: &T) {
        let Some(event) = encode(event, payload) else {
            return;
        };
        let rooms = self.read();
        for &member_id in member_ids {
            for (_, sender) in rooms.member_senders(member_id) {
                let _ = sender.send(event.clone());
            }
        }
    }

    /// Subscribes the connected sessions of `member_ids` to the group room.
    pub fn add_members_to_group_room(&self, member_ids: &[MemberId], group_id: GroupId) {
        let mut rooms = self.write();
        for &member_id in member_ids {
            rooms.join_group(member_id, group_id);
        }
    }

    pub fn remove_members_from_group_room(&self, member_ids: &[MemberId], group_id: GroupId) {
        let mut rooms = self.write();
        for &member_id in member_ids {
            rooms.leave_group(member_id, group_id);
        }
    }

    /// Members currently subscribed to the group room, ascending.
    pub fn group_room(&self, group_id: GroupId) -> Vec<MemberId> {
        self.read().group_members(group_id)
    }

    pub fn session_count(&self, member_id: MemberId) -> usize {
        self.read().session_count(member_id)
    }
}

fn encode<T: Serialize + ?Sized>(event: &str, payload: &T) -> Option<OutboundEvent> {
    match serde_json::to_value(payload) {
        Ok(payload) => Some(OutboundEvent::new(event, payload)),
        Err(err) => {
            tracing::warn!(event, "dropping event with unserializable payload: {err}");
            None
        }
    }
}
