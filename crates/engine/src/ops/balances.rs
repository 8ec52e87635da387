use sea_orm::TransactionTrait;

use crate::{
    Balance, GroupDebts, GroupId, MemberId, ResultEngine, Settlement, aggregate_balances,
    group_debts, settle,
};

use super::{Engine, with_tx};

impl Engine {
    /// Recomputes the per-member balances of a group from its stored
    /// expenses.
    ///
    /// Members without any share in the group's expenses are omitted.
    pub async fn balances(&self, group_id: GroupId) -> ResultEngine<Vec<Balance>> {
        with_tx!(self, |db_tx| {
            self.require_group_row(&db_tx, group_id).await?;
            let expenses = self.group_expenses_in(&db_tx, group_id).await?;
            Ok(aggregate_balances(&expenses))
        })
    }

    /// Settlement plan of a group. See [`settle`] for the pairing order.
    pub async fn settlements(&self, group_id: GroupId) -> ResultEngine<Vec<Settlement>> {
        let balances = self.balances(group_id).await?;
        Ok(settle(&balances))
    }

    /// Balances and settlement plan with member names, plus the position of
    /// `current_member` in the plan.
    pub async fn group_debts(
        &self,
        group_id: GroupId,
        current_member: MemberId,
    ) -> ResultEngine<GroupDebts> {
        with_tx!(self, |db_tx| {
            let group = self.load_group(&db_tx, group_id).await?;
            let expenses = self.group_expenses_in(&db_tx, group_id).await?;
            let balances = aggregate_balances(&expenses);
            Ok(group_debts(&group, &balances, current_member))
        })
    }
}
