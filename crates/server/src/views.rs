//! Conversions from engine values to API bodies.

use api_types::{
    debts::{
        BalanceView, GroupDebtsResponse, NamedBalanceView, NamedSettlementView, PositionView,
        SettlementView,
    },
    expense::{ExpenseView, ShareView},
    group::GroupView,
    history::{self, HistoryEntryView, SnapshotView},
    member::MemberView,
};
use engine::{
    Balance, Expense, ExpenseSnapshot, Group, GroupDebts, HistoryAction, HistoryEntry, Member,
    Settlement, Share,
};

pub(crate) fn member(member: &Member) -> MemberView {
    MemberView {
        id: member.id,
        name: member.name.clone(),
        email: member.email.clone(),
        registered: member.registered,
    }
}

pub(crate) fn group(group: &Group) -> GroupView {
    GroupView {
        id: group.id,
        name: group.name.clone(),
        members: group.members.iter().map(member).collect(),
        created_at: group.created_at,
    }
}

fn shares(shares: &[Share]) -> Vec<ShareView> {
    shares
        .iter()
        .map(|s| ShareView {
            member_id: s.member_id,
            amount_minor: s.amount.cents(),
        })
        .collect()
}

pub(crate) fn to_shares(views: &[ShareView]) -> Vec<Share> {
    views
        .iter()
        .map(|v| Share::new(v.member_id, v.amount_minor))
        .collect()
}

pub(crate) fn expense(expense: &Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        description: expense.description.clone(),
        amount_minor: expense.amount.cents(),
        group_id: expense.group_id,
        created_at: expense.created_at,
        payers: shares(&expense.payers),
        splits: shares(&expense.splits),
    }
}

pub(crate) fn balance(balance: &Balance) -> BalanceView {
    BalanceView {
        member_id: balance.member_id,
        paid_minor: balance.paid.cents(),
        owed_minor: balance.owed.cents(),
        balance_minor: balance.balance.cents(),
    }
}

pub(crate) fn settlement(settlement: &Settlement) -> SettlementView {
    SettlementView {
        from: settlement.from,
        to: settlement.to,
        amount_minor: settlement.amount.cents(),
    }
}

pub(crate) fn group_debts(debts: GroupDebts) -> GroupDebtsResponse {
    GroupDebtsResponse {
        balances: debts
            .balances
            .into_iter()
            .map(|b| NamedBalanceView {
                member_id: b.member_id,
                member_name: b.member_name,
                balance_minor: b.balance.cents(),
            })
            .collect(),
        transactions: debts
            .transactions
            .into_iter()
            .map(|t| NamedSettlementView {
                from: t.from,
                from_name: t.from_name,
                to: t.to,
                to_name: t.to_name,
                amount_minor: t.amount.cents(),
            })
            .collect(),
        my_position: PositionView {
            total_owed_minor: debts.my_position.total_owed.cents(),
            total_to_receive_minor: debts.my_position.total_to_receive.cents(),
            net_balance_minor: debts.my_position.net_balance.cents(),
        },
    }
}

fn snapshot(snapshot: &ExpenseSnapshot) -> SnapshotView {
    SnapshotView {
        description: snapshot.description.clone(),
        amount_minor: snapshot.amount.cents(),
        group_id: snapshot.group_id,
        payers: shares(&snapshot.payers),
        splits: shares(&snapshot.splits),
    }
}

pub(crate) fn history_entry(entry: &HistoryEntry) -> HistoryEntryView {
    HistoryEntryView {
        id: entry.id,
        expense_id: entry.expense_id,
        group_id: entry.group_id,
        member_id: entry.member_id,
        member_name: entry.member_name.clone(),
        action: match entry.action {
            HistoryAction::Created => history::HistoryAction::Created,
            HistoryAction::Updated => history::HistoryAction::Updated,
            HistoryAction::Deleted => history::HistoryAction::Deleted,
        },
        previous_data: entry.previous.as_ref().map(snapshot),
        new_data: entry.current.as_ref().map(snapshot),
        created_at: entry.created_at,
    }
}
