//! Room registry backing the [`Notifier`](super::Notifier).
//!
//! Two kinds of rooms exist:
//! - the personal room of a member: every connected session of that member
//! - the room of a group: the members currently subscribed to it
//!
//! A member only appears in a group room while at least one of their
//! sessions is connected.

use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc::UnboundedSender;

use crate::{GroupId, MemberId};

use super::{OutboundEvent, SessionId};

#[derive(Debug, Default)]
pub(super) struct Rooms {
    sessions: HashMap<SessionId, SessionHandle>,
    members: HashMap<MemberId, HashSet<SessionId>>,
    groups: HashMap<GroupId, HashSet<MemberId>>,
}

#[derive(Debug)]
struct SessionHandle {
    member_id: MemberId,
    sender: UnboundedSender<OutboundEvent>,
}

impl Rooms {
    pub(super) fn register(
        &mut self,
        session_id: SessionId,
        member_id: MemberId,
        sender: UnboundedSender<OutboundEvent>,
    ) {
        self.sessions
            .insert(session_id, SessionHandle { member_id, sender });
        self.members.entry(member_id).or_default().insert(session_id);
    }

    /// Removes a session. When it was the member's last one, the member
    /// leaves every group room too.
    pub(super) fn unregister(&mut self, session_id: SessionId) -> bool {
        let Some(handle) = self.sessions.remove(&session_id) else {
            return false;
        };
        let member_id = handle.member_id;
        let last = match self.members.get_mut(&member_id) {
            Some(sessions) => {
                sessions.remove(&session_id);
                sessions.is_empty()
            }
            None => true,
        };
        if last {
            self.members.remove(&member_id);
            self.groups.retain(|_, members| {
                members.remove(&member_id);
                !members.is_empty()
            });
        }
        true
    }

    pub(super) fn is_connected(&self, member_id: MemberId) -> bool {
        self.members
            .get(&member_id)
            .is_some_and(|sessions| !sessions.is_empty())
    }

    pub(super) fn join_group(&mut self, member_id: MemberId, group_id: GroupId) {
        if self.is_connected(member_id) {
            self.groups.entry(group_id).or_default().insert(member_id);
        }
    }

    pub(super) fn leave_group(&mut self, member_id: MemberId, group_id: GroupId) {
        if let Some(members) = self.groups.get_mut(&group_id) {
            members.remove(&member_id);
            if members.is_empty() {
                self.groups.remove(&group_id);
            }
        }
    }

    /// Points an existing session at a new outbound channel.
    pub(super) fn replace_sender(&mut self, session_id: SessionId, sender: UnboundedSender<OutboundEvent>) {
        if let Some(handle) = self.sessions.get_mut(&session_id) {
            handle.sender = sender;
        }
    }

    /// Senders of every session of `member_id`.
    pub(super) fn member_senders(
        &self,
        member_id: MemberId,
    ) -> impl Iterator<Item = (SessionId, &UnboundedSender<OutboundEvent>)> + '_ {
        self.members
            .get(&member_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.sessions.get(id).map(|h| (*id, &h.sender)))
    }

    pub(super) fn group_members(&self, group_id: GroupId) -> Vec<MemberId> {
        let mut members: Vec<MemberId> = self
            .groups
            .get(&group_id)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default();
        members.sort_unstable();
        members
    }

    pub(super) fn session_count(&self, member_id: MemberId) -> usize {
        self.members.get(&member_id).map_or(0, HashSet::len)
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::unbounded_channel;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn last_session_leaves_group_rooms() {
        let mut rooms = Rooms::default();
        let (tx, _rx) = unbounded_channel();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        rooms.register(first, 7, tx.clone());
        rooms.register(second, 7, tx);
        rooms.join_group(7, 1);
        assert_eq!(rooms.group_members(1), vec![7]);

        assert!(rooms.unregister(first));
        assert_eq!(rooms.group_members(1), vec![7]);

        assert!(rooms.unregister(second));
        assert!(rooms.group_members(1).is_empty());
        assert!(!rooms.is_connected(7));
        assert!(!rooms.unregister(second));
    }

    #[test]
    fn offline_members_do_not_join_rooms() {
        let mut rooms = Rooms::default();
        rooms.join_group(3, 1);
        assert!(rooms.group_members(1).is_empty());
    }
}
