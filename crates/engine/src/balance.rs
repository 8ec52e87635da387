//! Per-member balances of a group.
//!
//! `paid` sums the member's payer shares, `owed` sums their split shares and
//! `balance = paid - owed`. A positive balance means the group owes the
//! member money.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Expense, MemberId, MoneyCents};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub member_id: MemberId,
    pub paid: MoneyCents,
    pub owed: MoneyCents,
    pub balance: MoneyCents,
}

/// Aggregates balances over a set of expenses.
///
/// Only members appearing in at least one share are returned, ordered by
/// ascending member id. Amounts are not validated here.
pub fn aggregate_balances<'a, I>(expenses: I) -> Vec<Balance>
where
    I: IntoIterator<Item = &'a Expense>,
{
    let mut totals: BTreeMap<MemberId, (MoneyCents, MoneyCents)> = BTreeMap::new();

    for expense in expenses {
        for payer in &expense.payers {
            totals.entry(payer.member_id).or_default().0 += payer.amount;
        }
        for split in &expense.splits {
            totals.entry(split.member_id).or_default().1 += split.amount;
        }
    }

    totals
        .into_iter()
        .map(|(member_id, (paid, owed))| Balance {
            member_id,
            paid,
            owed,
            balance: paid - owed,
        })
        .collect()
}
