//! Settlement of group balances.
//!
//! The solver is a greedy two-pointer match, not an optimal minimum cash
//! flow: clients render "who pays whom" straight from its output, so the
//! pairing order below is part of the contract.
//!
//! 1. Debtors are members with a negative balance, creditors those with a
//!    positive one. Input balances arrive in ascending member id order.
//! 2. Debtors are stable-sorted by ascending debt, creditors by descending
//!    credit. Equal amounts keep ascending member id order.
//! 3. The current debtor pays the current creditor `min(debt, credit)`; the
//!    side that reaches zero advances (both when they tie).
//!
//! Amounts are exact cents, so no rounding happens between steps and every
//! reported transfer is already at two decimals.

use serde::{Deserialize, Serialize};

use crate::{Balance, Group, MemberId, MoneyCents};

/// A recommended payment `from` a debtor `to` a creditor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: MoneyCents,
}

/// A member's participation in a settlement plan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub total_owed: MoneyCents,
    pub total_to_receive: MoneyCents,
    pub net_balance: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedBalance {
    pub member_id: MemberId,
    pub member_name: String,
    pub balance: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedSettlement {
    pub from: MemberId,
    pub from_name: String,
    pub to: MemberId,
    pub to_name: String,
    pub amount: MoneyCents,
}

/// Balances and settlement plan of a group, seen from one member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDebts {
    pub balances: Vec<NamedBalance>,
    pub transactions: Vec<NamedSettlement>,
    pub my_position: Position,
}

/// Computes the settlement plan for `balances`.
///
/// Runs at most `debtors + creditors` matching steps and never emits a
/// transfer of zero.
pub fn settle(balances: &[Balance]) -> Vec<Settlement> {
    // Partition on exact cents rather than a one-cent dead band: a 1-cent
    // balance is a real debt and yields a 1-cent transfer, and only members
    // at exactly zero are left out.
    let mut debtors: Vec<(MemberId, MoneyCents)> = balances
        .iter()
        .filter(|b| b.balance.is_negative())
        .map(|b| (b.member_id, -b.balance))
        .collect();
    let mut creditors: Vec<(MemberId, MoneyCents)> = balances
        .iter()
        .filter(|b| b.balance.is_positive())
        .map(|b| (b.member_id, b.balance))
        .collect();

    debtors.sort_by(|a, b| a.1.cmp(&b.1));
    creditors.sort_by(|a, b| b.1.cmp(&a.1));

    let mut settlements = Vec::with_capacity(debtors.len() + creditors.len());
    let (mut i, mut j) = (0, 0);

    while i < debtors.len() && j < creditors.len() {
        let (debtor, debt) = &mut debtors[i];
        let (creditor, credit) = &mut creditors[j];

        let amount = (*debt).min(*credit);
        settlements.push(Settlement {
            from: *debtor,
            to: *creditor,
            amount,
        });

        *debt -= amount;
        *credit -= amount;

        if debt.is_zero() {
            i += 1;
        }
        if credit.is_zero() {
            j += 1;
        }
    }

    settlements
}

/// Sums what `member_id` pays and receives across `settlements`.
pub fn position(settlements: &[Settlement], member_id: MemberId) -> Position {
    let total_owed: MoneyCents = settlements
        .iter()
        .filter(|s| s.from == member_id)
        .map(|s| s.amount)
        .sum();
    let total_to_receive: MoneyCents = settlements
        .iter()
        .filter(|s| s.to == member_id)
        .map(|s| s.amount)
        .sum();
    Position {
        total_owed,
        total_to_receive,
        net_balance: total_to_receive - total_owed,
    }
}

/// Decorates balances and the settlement plan with member names.
pub fn group_debts(group: &Group, balances: &[Balance], current_member: MemberId) -> GroupDebts {
    let settlements = settle(balances);
    let my_position = position(&settlements, current_member);

    GroupDebts {
        balances: balances
            .iter()
            .map(|b| NamedBalance {
                member_id: b.member_id,
                member_name: group.member_name(b.member_id).to_string(),
                balance: b.balance,
            })
            .collect(),
        transactions: settlements
            .into_iter()
            .map(|s| NamedSettlement {
                from: s.from,
                from_name: group.member_name(s.from).to_string(),
                to: s.to,
                to_name: group.member_name(s.to).to_string(),
                amount: s.amount,
            })
            .collect(),
        my_position,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn balances(values: &[(MemberId, i64)]) -> Vec<Balance> {
        values
            .iter()
            .map(|&(member_id, cents)| {
                let balance = MoneyCents::new(cents);
                let (paid, owed) = if balance.is_negative() {
                    (MoneyCents::ZERO, -balance)
                } else {
                    (balance, MoneyCents::ZERO)
                };
                Balance {
                    member_id,
                    paid,
                    owed,
                    balance,
                }
            })
            .collect()
    }

    #[test]
    fn dinner_example() {
        let plan = settle(&balances(&[(1, 50_00), (2, -50_00)]));
        assert_eq!(
            plan,
            vec![Settlement {
                from: 2,
                to: 1,
                amount: MoneyCents::new(50_00),
            }]
        );
    }

    #[test]
    fn smallest_debtor_pays_largest_creditor_first() {
        // debtors sorted: 3 (10), 2 (40); creditors sorted: 1 (30), 4 (20)
        let plan = settle(&balances(&[(1, 30_00), (2, -40_00), (3, -10_00), (4, 20_00)]));
        let pairs: Vec<_> = plan.iter().map(|s| (s.from, s.to, s.amount.cents())).collect();
        assert_eq!(
            pairs,
            vec![(3, 1, 10_00), (2, 1, 20_00), (2, 4, 20_00)]
        );
    }

    #[test]
    fn ties_keep_member_id_order() {
        let plan = settle(&balances(&[(1, 10_00), (2, 10_00), (3, -10_00), (4, -10_00)]));
        let pairs: Vec<_> = plan.iter().map(|s| (s.from, s.to)).collect();
        assert_eq!(pairs, vec![(3, 1), (4, 2)]);
    }

    #[test]
    fn transfers_cover_every_balance() {
        let input = balances(&[
            (1, 123_45),
            (2, -33_33),
            (3, -90_12),
            (4, 7_77),
            (5, -7_77),
            (6, 0),
        ]);
        let plan = settle(&input);

        assert!(plan.iter().all(|s| s.amount.is_positive()));
        assert!(plan.len() <= 5);

        let mut paid: HashMap<MemberId, MoneyCents> = HashMap::new();
        let mut received: HashMap<MemberId, MoneyCents> = HashMap::new();
        for s in &plan {
            *paid.entry(s.from).or_default() += s.amount;
            *received.entry(s.to).or_default() += s.amount;
        }
        for b in &input {
            if b.balance.is_negative() {
                assert_eq!(paid.get(&b.member_id).copied(), Some(-b.balance));
            } else if b.balance.is_positive() {
                assert_eq!(received.get(&b.member_id).copied(), Some(b.balance));
            } else {
                assert!(!paid.contains_key(&b.member_id));
                assert!(!received.contains_key(&b.member_id));
            }
        }
    }

    #[test]
    fn one_cent_residue_is_settled() {
        let plan = settle(&balances(&[(1, 1), (2, -1), (3, 0)]));
        assert_eq!(
            plan,
            vec![Settlement {
                from: 2,
                to: 1,
                amount: MoneyCents::new(1),
            }]
        );
    }

    #[test]
    fn settled_group_has_no_transfers() {
        assert!(settle(&balances(&[(1, 0), (2, 0)])).is_empty());
        assert!(settle(&[]).is_empty());
    }

    #[test]
    fn position_sums_member_participation() {
        let plan = settle(&balances(&[(1, 30_00), (2, -40_00), (3, -10_00), (4, 20_00)]));
        assert_eq!(
            position(&plan, 2),
            Position {
                total_owed: MoneyCents::new(40_00),
                total_to_receive: MoneyCents::ZERO,
                net_balance: MoneyCents::new(-40_00),
            }
        );
        assert_eq!(position(&plan, 1).net_balance, MoneyCents::new(30_00));
        assert_eq!(position(&plan, 99), Position::default());
    }
}
