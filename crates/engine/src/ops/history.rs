use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
    TransactionTrait, prelude::*,
};

use crate::{
    Expense, ExpenseId, GroupId, HistoryEntry, MemberId, ResultEngine, expenses,
    history::{self, HistoryAction},
    members,
};

use super::{Engine, with_tx};

impl Engine {
    /// History of every expense in the groups `member_id` belongs to,
    /// newest first.
    ///
    /// An existing expense is matched by the group it is in now, so moving
    /// it to another group moves its whole history along. A deleted expense
    /// is matched by the group recorded in its newest entry.
    pub async fn history_for_member(&self, member_id: MemberId) -> ResultEngine<Vec<HistoryEntry>> {
        with_tx!(self, |db_tx| {
            let group_ids: BTreeSet<GroupId> = self
                .member_group_ids(&db_tx, member_id)
                .await?
                .into_iter()
                .collect();
            if group_ids.is_empty() {
                return Ok(Vec::new());
            }

            let mut expense_ids: BTreeSet<ExpenseId> = expenses::Entity::find()
                .select_only()
                .column(expenses::Column::Id)
                .filter(expenses::Column::GroupId.is_in(group_ids.iter().copied()))
                .into_tuple::<ExpenseId>()
                .all(&db_tx)
                .await?
                .into_iter()
                .collect();
            expense_ids.extend(self.deleted_expenses_in(&db_tx, &group_ids).await?);

            if expense_ids.is_empty() {
                return Ok(Vec::new());
            }
            let query = history::Entity::find()
                .filter(history::Column::ExpenseId.is_in(expense_ids));
            self.load_history(&db_tx, query).await
        })
    }

    /// History of one expense, newest first. An expense that never existed
    /// simply has no entries.
    pub async fn history_for_expense(
        &self,
        expense_id: ExpenseId,
    ) -> ResultEngine<Vec<HistoryEntry>> {
        with_tx!(self, |db_tx| {
            let query = history::Entity::find()
                .filter(history::Column::ExpenseId.eq(expense_id));
            self.load_history(&db_tx, query).await
        })
    }

    /// Appends one history entry inside the caller's transaction.
    ///
    /// Best-effort with respect to the actor: when `actor` does not resolve
    /// to a member, nothing is written and the mutation goes on. Storage
    /// errors still fail the surrounding transaction.
    pub(super) async fn record_history(
        &self,
        db: &DatabaseTransaction,
        actor: MemberId,
        action: HistoryAction,
        previous: Option<&Expense>,
        current: Option<&Expense>,
    ) -> ResultEngine<()> {
        let Some(subject) = current.or(previous) else {
            return Ok(());
        };

        if members::Entity::find_by_id(actor).one(db).await?.is_none() {
            tracing::warn!(
                expense_id = subject.id,
                actor,
                action = action.as_str(),
                "skipping history entry: unknown actor"
            );
            return Ok(());
        }

        let snapshot = |expense: Option<&Expense>| -> ResultEngine<Option<Json>> {
            expense
                .map(|e| serde_json::to_value(e.snapshot()))
                .transpose()
                .map_err(Into::into)
        };

        let active = history::ActiveModel {
            id: ActiveValue::NotSet,
            expense_id: ActiveValue::Set(subject.id),
            group_id: ActiveValue::Set(subject.group_id),
            member_id: ActiveValue::Set(actor),
            action: ActiveValue::Set(action.as_str().to_string()),
            previous_data: ActiveValue::Set(snapshot(previous)?),
            new_data: ActiveValue::Set(snapshot(current)?),
            created_at: ActiveValue::Set(Utc::now()),
        };
        active.insert(db).await?;
        tracing::debug!(expense_id = subject.id, actor, action = action.as_str(), "history recorded");
        Ok(())
    }

    /// Ids of deleted expenses whose last recorded group is in `group_ids`.
    async fn deleted_expenses_in(
        &self,
        db: &DatabaseTransaction,
        group_ids: &BTreeSet<GroupId>,
    ) -> ResultEngine<BTreeSet<ExpenseId>> {
        let live = expenses::Entity::find()
            .select_only()
            .column(expenses::Column::Id)
            .into_query();
        let rows = history::Entity::find()
            .select_only()
            .column(history::Column::ExpenseId)
            .column(history::Column::GroupId)
            .filter(history::Column::ExpenseId.not_in_subquery(live))
            .order_by_desc(history::Column::CreatedAt)
            .order_by_desc(history::Column::Id)
            .into_tuple::<(ExpenseId, GroupId)>()
            .all(db)
            .await?;

        let mut last_group: BTreeMap<ExpenseId, GroupId> = BTreeMap::new();
        for (expense_id, group_id) in rows {
            last_group.entry(expense_id).or_insert(group_id);
        }
        Ok(last_group
            .into_iter()
            .filter(|(_, group_id)| group_ids.contains(group_id))
            .map(|(expense_id, _)| expense_id)
            .collect())
    }

    async fn load_history(
        &self,
        db: &DatabaseTransaction,
        query: Select<history::Entity>,
    ) -> ResultEngine<Vec<HistoryEntry>> {
        query
            .order_by_desc(history::Column::CreatedAt)
            .order_by_desc(history::Column::Id)
            .find_also_related(members::Entity)
            .all(db)
            .await?
            .into_iter()
            .map(|(model, actor)| HistoryEntry::from_models(model, actor))
            .collect()
    }
}
