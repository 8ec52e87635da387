//! Request and response bodies of the HTTP API.
//!
//! Money is always transferred as integer cents (`*_minor` fields).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod member {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberNew {
        pub name: String,
        pub email: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MemberView {
        pub id: i64,
        pub name: String,
        pub email: Option<String>,
        pub registered: bool,
    }

    /// Returned on registration: the member and a bearer token for it.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberCreated {
        pub member: MemberView,
        pub token: String,
    }
}

pub mod group {
    use super::*;
    use crate::member::MemberView;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupNew {
        pub name: String,
        pub member_ids: Vec<i64>,
    }

    /// Placeholder member invited by email.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExtraMember {
        pub name: String,
        pub email: String,
    }

    /// Replaces name and member set of a group.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupUpdate {
        pub name: String,
        pub member_ids: Vec<i64>,
        #[serde(default)]
        pub extra_members: Vec<ExtraMember>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct GroupView {
        pub id: i64,
        pub name: String,
        pub members: Vec<MemberView>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupsResponse {
        pub groups: Vec<GroupView>,
    }
}

pub mod expense {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ShareView {
        pub member_id: i64,
        pub amount_minor: i64,
    }

    /// Body of both create and update requests.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseWrite {
        pub description: String,
        pub amount_minor: i64,
        pub group_id: i64,
        pub payers: Vec<ShareView>,
        pub splits: Vec<ShareView>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: i64,
        pub description: String,
        pub amount_minor: i64,
        pub group_id: i64,
        pub created_at: DateTime<Utc>,
        pub payers: Vec<ShareView>,
        pub splits: Vec<ShareView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpensesResponse {
        pub expenses: Vec<ExpenseView>,
    }

    /// Query string selecting a group.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupQuery {
        pub group_id: i64,
    }
}

pub mod debts {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BalanceView {
        pub member_id: i64,
        pub paid_minor: i64,
        pub owed_minor: i64,
        pub balance_minor: i64,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SettlementView {
        pub from: i64,
        pub to: i64,
        pub amount_minor: i64,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct NamedBalanceView {
        pub member_id: i64,
        pub member_name: String,
        pub balance_minor: i64,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct NamedSettlementView {
        pub from: i64,
        pub from_name: String,
        pub to: i64,
        pub to_name: String,
        pub amount_minor: i64,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PositionView {
        pub total_owed_minor: i64,
        pub total_to_receive_minor: i64,
        pub net_balance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalancesResponse {
        pub balances: Vec<BalanceView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementsResponse {
        pub transactions: Vec<SettlementView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupDebtsResponse {
        pub balances: Vec<NamedBalanceView>,
        pub transactions: Vec<NamedSettlementView>,
        pub my_position: PositionView,
    }
}

pub mod history {
    use super::*;
    use crate::expense::ShareView;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum HistoryAction {
        Created,
        Updated,
        Deleted,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SnapshotView {
        pub description: String,
        pub amount_minor: i64,
        pub group_id: i64,
        pub payers: Vec<ShareView>,
        pub splits: Vec<ShareView>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct HistoryEntryView {
        pub id: i64,
        pub expense_id: i64,
        pub group_id: i64,
        pub member_id: i64,
        pub member_name: Option<String>,
        pub action: HistoryAction,
        pub previous_data: Option<SnapshotView>,
        pub new_data: Option<SnapshotView>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct HistoryResponse {
        pub entries: Vec<HistoryEntryView>,
    }
}
