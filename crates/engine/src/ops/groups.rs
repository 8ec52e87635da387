use std::collections::BTreeSet;

use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    EngineError, Group, GroupId, MemberId, NewGroupCmd, ResultEngine, UpdateGroupCmd,
    group_members, groups,
    notifier::{ADDED_TO_GROUP, GROUP_CREATED},
    util::{normalize_email, normalize_required_text},
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a group with the given members.
    ///
    /// Once committed, the members join the group room and each of them
    /// receives a `GROUP_CREATED` event.
    pub async fn create_group(&self, cmd: NewGroupCmd) -> ResultEngine<Group> {
        let name = normalize_required_text(&cmd.name, "group name")?;
        let member_ids: BTreeSet<MemberId> = cmd.member_ids.into_iter().collect();
        if member_ids.is_empty() {
            return Err(EngineError::InvalidGroup(
                "a group needs at least one member".to_string(),
            ));
        }

        let group = with_tx!(self, |db_tx| {
            self.require_members_exist(&db_tx, &member_ids).await?;

            let active = groups::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name),
                created_at: ActiveValue::Set(Utc::now()),
            };
            let model = active.insert(&db_tx).await?;
            self.replace_group_members(&db_tx, model.id, &member_ids)
                .await?;
            self.load_group(&db_tx, model.id).await
        })?;

        tracing::info!(group_id = group.id, members = group.members.len(), "group created");

        let ids = group.member_ids();
        self.notifier.add_members_to_group_room(&ids, group.id);
        self.notifier
            .notify_members(&ids, GROUP_CREATED, &serde_json::json!({ "group": &group }));
        Ok(group)
    }

    /// Renames a group and replaces its member set.
    ///
    /// `extra_members` are created as unregistered members first; an email
    /// already used by another member fails the whole update. Members that
    /// are no longer part of the group leave its room, the remaining ones
    /// receive `ADDED_TO_GROUP`.
    pub async fn update_group(&self, cmd: UpdateGroupCmd) -> ResultEngine<Group> {
        let name = normalize_required_text(&cmd.name, "group name")?;
        let extras = cmd
            .extra_members
            .iter()
            .map(|extra| {
                Ok((
                    normalize_required_text(&extra.name, "member name")?,
                    normalize_email(&extra.email)?,
                ))
            })
            .collect::<ResultEngine<Vec<_>>>()?;
        let mut member_ids: BTreeSet<MemberId> = cmd.member_ids.into_iter().collect();
        if member_ids.is_empty() && extras.is_empty() {
            return Err(EngineError::InvalidGroup(
                "a group needs at least one member".to_string(),
            ));
        }

        let (previous, group) = with_tx!(self, |db_tx| {
            let previous = self.load_group(&db_tx, cmd.group_id).await?;
            self.require_members_exist(&db_tx, &member_ids).await?;

            for (extra_name, email) in extras {
                let member = self
                    .insert_member(&db_tx, extra_name, Some(email), false)
                    .await?;
                member_ids.insert(member.id);
            }

            let active = groups::ActiveModel {
                id: ActiveValue::Set(cmd.group_id),
                name: ActiveValue::Set(name),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            self.replace_group_members(&db_tx, cmd.group_id, &member_ids)
                .await?;

            let group = self.load_group(&db_tx, cmd.group_id).await?;
            Ok((previous, group))
        })?;

        let current = group.member_ids();
        let removed: Vec<MemberId> = previous
            .member_ids()
            .into_iter()
            .filter(|id| !group.has_member(*id))
            .collect();
        tracing::info!(
            group_id = group.id,
            members = current.len(),
            removed = removed.len(),
            "group updated"
        );

        self.notifier.add_members_to_group_room(&current, group.id);
        self.notifier
            .remove_members_from_group_room(&removed, group.id);
        self.notifier
            .notify_members(&current, ADDED_TO_GROUP, &serde_json::json!({ "group": &group }));
        Ok(group)
    }

    pub async fn group(&self, group_id: GroupId) -> ResultEngine<Group> {
        with_tx!(self, |db_tx| self.load_group(&db_tx, group_id).await)
    }

    /// Every group `member_id` belongs to, ascending by id.
    pub async fn groups_for_member(&self, member_id: MemberId) -> ResultEngine<Vec<Group>> {
        with_tx!(self, |db_tx| {
            let ids = self.member_group_ids(&db_tx, member_id).await?;
            self.load_groups(&db_tx, ids).await
        })
    }

    async fn replace_group_members(
        &self,
        db: &DatabaseTransaction,
        group_id: GroupId,
        member_ids: &BTreeSet<MemberId>,
    ) -> ResultEngine<()> {
        group_members::Entity::delete_many()
            .filter(group_members::Column::GroupId.eq(group_id))
            .exec(db)
            .await?;
        let rows = member_ids.iter().map(|&member_id| group_members::ActiveModel {
            group_id: ActiveValue::Set(group_id),
            member_id: ActiveValue::Set(member_id),
        });
        group_members::Entity::insert_many(rows)
            .exec_without_returning(db)
            .await?;
        Ok(())
    }
}
