use std::collections::BTreeSet;

use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, prelude::*};

use crate::{
    EngineError, Expense, ExpenseId, Group, GroupId, MemberId, ResultEngine, expenses,
    group_members, groups, members, shares,
};

use super::Engine;

/// Generates a `require_*` method returning the row or a `KeyNotFound`.
macro_rules! impl_require_row {
    ($require_fn:ident, $entity:path, $model:path, $err_msg:literal) => {
        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            id: i64,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!($err_msg, id)))
        }
    };
}

impl Engine {
    impl_require_row!(
        require_group_row,
        groups::Entity,
        groups::Model,
        "group {} not exists"
    );

    impl_require_row!(
        require_expense_row,
        expenses::Entity,
        expenses::Model,
        "expense {} not exists"
    );

    impl_require_row!(
        require_member_row,
        members::Entity,
        members::Model,
        "member {} not exists"
    );

    /// Fails with `KeyNotFound` naming the first missing member.
    pub(super) async fn require_members_exist(
        &self,
        db: &DatabaseTransaction,
        member_ids: &BTreeSet<MemberId>,
    ) -> ResultEngine<()> {
        if member_ids.is_empty() {
            return Ok(());
        }
        let found: BTreeSet<MemberId> = members::Entity::find()
            .select_only()
            .column(members::Column::Id)
            .filter(members::Column::Id.is_in(member_ids.iter().copied()))
            .into_tuple::<i64>()
            .all(db)
            .await?
            .into_iter()
            .collect();
        match member_ids.difference(&found).next() {
            Some(missing) => Err(EngineError::KeyNotFound(format!(
                "member {missing} not exists"
            ))),
            None => Ok(()),
        }
    }

    pub(super) async fn load_group(
        &self,
        db: &DatabaseTransaction,
        group_id: GroupId,
    ) -> ResultEngine<Group> {
        let model = self.require_group_row(db, group_id).await?;
        let members = model.find_related(members::Entity).all(db).await?;
        Ok(Group::from_models(model, members))
    }

    pub(super) async fn load_groups(
        &self,
        db: &DatabaseTransaction,
        group_ids: Vec<GroupId>,
    ) -> ResultEngine<Vec<Group>> {
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = groups::Entity::find()
            .filter(groups::Column::Id.is_in(group_ids))
            .order_by_asc(groups::Column::Id)
            .find_with_related(members::Entity)
            .all(db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(model, members)| Group::from_models(model, members))
            .collect())
    }

    /// Ids of the groups `member_id` belongs to, ascending.
    pub(super) async fn member_group_ids(
        &self,
        db: &DatabaseTransaction,
        member_id: MemberId,
    ) -> ResultEngine<Vec<GroupId>> {
        group_members::Entity::find()
            .select_only()
            .column(group_members::Column::GroupId)
            .filter(group_members::Column::MemberId.eq(member_id))
            .order_by_asc(group_members::Column::GroupId)
            .into_tuple::<i64>()
            .all(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn load_expense(
        &self,
        db: &DatabaseTransaction,
        expense_id: ExpenseId,
    ) -> ResultEngine<Expense> {
        let model = self.require_expense_row(db, expense_id).await?;
        let shares = model.find_related(shares::Entity).all(db).await?;
        Expense::from_models(model, shares)
    }

    /// Loads expenses (with shares) in the order the query returns them.
    pub(super) async fn load_expenses(
        &self,
        db: &DatabaseTransaction,
        query: Select<expenses::Entity>,
    ) -> ResultEngine<Vec<Expense>> {
        query
            .find_with_related(shares::Entity)
            .all(db)
            .await?
            .into_iter()
            .map(|(model, shares)| Expense::from_models(model, shares))
            .collect()
    }
}
