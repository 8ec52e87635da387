use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Expense, ExpenseId, GroupId, MemberId, NewExpenseCmd, ResultEngine, Share, UpdateExpenseCmd,
    expenses,
    history::HistoryAction,
    shares::{self, ShareKind},
    util::{normalize_required_text, share_members, validate_expense_shares},
};

use super::{Engine, with_tx};

impl Engine {
    /// Records a new expense with its payer and split shares.
    ///
    /// Each share list must add up to `amount` within one cent and every
    /// referenced member must exist. The expense, its shares and the
    /// `created` history entry are written in one transaction.
    pub async fn create_expense(&self, cmd: NewExpenseCmd) -> ResultEngine<Expense> {
        let description = normalize_required_text(&cmd.description, "description")?;
        validate_expense_shares(cmd.amount, &cmd.payers, &cmd.splits)?;

        let expense = with_tx!(self, |db_tx| {
            self.require_group_row(&db_tx, cmd.group_id).await?;
            self.require_members_exist(&db_tx, &share_members(&cmd.payers, &cmd.splits))
                .await?;

            let active = expenses::ActiveModel {
                id: ActiveValue::NotSet,
                description: ActiveValue::Set(description),
                amount_minor: ActiveValue::Set(cmd.amount.cents()),
                group_id: ActiveValue::Set(cmd.group_id),
                created_at: ActiveValue::Set(Utc::now()),
            };
            let model = active.insert(&db_tx).await?;
            self.insert_shares(&db_tx, model.id, &cmd.payers, &cmd.splits)
                .await?;

            let expense = self.load_expense(&db_tx, model.id).await?;
            self.record_history(
                &db_tx,
                cmd.acting_member,
                HistoryAction::Created,
                None,
                Some(&expense),
            )
            .await?;
            Ok(expense)
        })?;

        tracing::info!(
            expense_id = expense.id,
            group_id = expense.group_id,
            amount = %expense.amount,
            "expense created"
        );
        Ok(expense)
    }

    /// Replaces the body and every share of an expense.
    ///
    /// Validation runs before anything is written, so a rejected update
    /// leaves the expense exactly as it was.
    pub async fn update_expense(&self, cmd: UpdateExpenseCmd) -> ResultEngine<Expense> {
        let description = normalize_required_text(&cmd.description, "description")?;
        validate_expense_shares(cmd.amount, &cmd.payers, &cmd.splits)?;

        let expense = with_tx!(self, |db_tx| {
            let previous = self.load_expense(&db_tx, cmd.expense_id).await?;
            self.require_group_row(&db_tx, cmd.group_id).await?;
            self.require_members_exist(&db_tx, &share_members(&cmd.payers, &cmd.splits))
                .await?;

            let active = expenses::ActiveModel {
                id: ActiveValue::Set(cmd.expense_id),
                description: ActiveValue::Set(description),
                amount_minor: ActiveValue::Set(cmd.amount.cents()),
                group_id: ActiveValue::Set(cmd.group_id),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            shares::Entity::delete_many()
                .filter(shares::Column::ExpenseId.eq(cmd.expense_id))
                .exec(&db_tx)
                .await?;
            self.insert_shares(&db_tx, cmd.expense_id, &cmd.payers, &cmd.splits)
                .await?;

            let expense = self.load_expense(&db_tx, cmd.expense_id).await?;
            self.record_history(
                &db_tx,
                cmd.acting_member,
                HistoryAction::Updated,
                Some(&previous),
                Some(&expense),
            )
            .await?;
            Ok(expense)
        })?;

        tracing::info!(
            expense_id = expense.id,
            group_id = expense.group_id,
            amount = %expense.amount,
            "expense updated"
        );
        Ok(expense)
    }

    /// Deletes an expense and its shares. Its history is kept, including
    /// the `deleted` entry written here.
    pub async fn delete_expense(
        &self,
        expense_id: ExpenseId,
        acting_member: MemberId,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let previous = self.load_expense(&db_tx, expense_id).await?;

            shares::Entity::delete_many()
                .filter(shares::Column::ExpenseId.eq(expense_id))
                .exec(&db_tx)
                .await?;
            expenses::Entity::delete_by_id(expense_id)
                .exec(&db_tx)
                .await?;

            self.record_history(
                &db_tx,
                acting_member,
                HistoryAction::Deleted,
                Some(&previous),
                None,
            )
            .await
        })?;

        tracing::info!(expense_id, "expense deleted");
        Ok(())
    }

    pub async fn expense(&self, expense_id: ExpenseId) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| self.load_expense(&db_tx, expense_id).await)
    }

    /// Expenses of a group, ascending by id.
    pub async fn group_expenses(&self, group_id: GroupId) -> ResultEngine<Vec<Expense>> {
        with_tx!(self, |db_tx| {
            self.require_group_row(&db_tx, group_id).await?;
            self.group_expenses_in(&db_tx, group_id).await
        })
    }

    /// Expenses of every group `member_id` belongs to, newest first.
    pub async fn member_expenses(&self, member_id: MemberId) -> ResultEngine<Vec<Expense>> {
        with_tx!(self, |db_tx| {
            let group_ids = self.member_group_ids(&db_tx, member_id).await?;
            if group_ids.is_empty() {
                return Ok(Vec::new());
            }
            let query = expenses::Entity::find()
                .filter(expenses::Column::GroupId.is_in(group_ids))
                .order_by_desc(expenses::Column::CreatedAt)
                .order_by_desc(expenses::Column::Id);
            self.load_expenses(&db_tx, query).await
        })
    }

    pub(super) async fn group_expenses_in(
        &self,
        db: &DatabaseTransaction,
        group_id: GroupId,
    ) -> ResultEngine<Vec<Expense>> {
        let query = expenses::Entity::find()
            .filter(expenses::Column::GroupId.eq(group_id))
            .order_by_asc(expenses::Column::Id);
        self.load_expenses(db, query).await
    }

    async fn insert_shares(
        &self,
        db: &DatabaseTransaction,
        expense_id: ExpenseId,
        payers: &[Share],
        splits: &[Share],
    ) -> ResultEngine<()> {
        let rows = payers
            .iter()
            .map(|s| shares::ActiveModel::for_share(expense_id, ShareKind::Payer, s))
            .chain(
                splits
                    .iter()
                    .map(|s| shares::ActiveModel::for_share(expense_id, ShareKind::Split, s)),
            );
        shares::Entity::insert_many(rows)
            .exec_without_returning(db)
            .await?;
        Ok(())
    }
}
