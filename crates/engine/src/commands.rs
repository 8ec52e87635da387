//! Command structs for engine operations.
//!
//! These types group parameters for write operations
//! (expense create/update, group create/update), keeping call sites readable
//! and avoiding long argument lists.

use crate::{ExpenseId, GroupId, MemberId, MoneyCents, Share};

/// Create an expense in a group.
#[derive(Clone, Debug)]
pub struct NewExpenseCmd {
    pub description: String,
    pub amount: MoneyCents,
    pub group_id: GroupId,
    pub payers: Vec<Share>,
    pub splits: Vec<Share>,
    /// Member recorded as the author in the expense history.
    pub acting_member: MemberId,
}

impl NewExpenseCmd {
    #[must_use]
    pub fn new(
        group_id: GroupId,
        acting_member: MemberId,
        description: impl Into<String>,
        amount: impl Into<MoneyCents>,
    ) -> Self {
        Self {
            description: description.into(),
            amount: amount.into(),
            group_id,
            payers: Vec::new(),
            splits: Vec::new(),
            acting_member,
        }
    }

    #[must_use]
    pub fn payer(mut self, member_id: MemberId, amount: impl Into<MoneyCents>) -> Self {
        self.payers.push(Share::new(member_id, amount));
        self
    }

    #[must_use]
    pub fn split(mut self, member_id: MemberId, amount: impl Into<MoneyCents>) -> Self {
        self.splits.push(Share::new(member_id, amount));
        self
    }

    #[must_use]
    pub fn payers(mut self, payers: Vec<Share>) -> Self {
        self.payers = payers;
        self
    }

    #[must_use]
    pub fn splits(mut self, splits: Vec<Share>) -> Self {
        self.splits = splits;
        self
    }
}

/// Replace an expense body and all of its shares.
#[derive(Clone, Debug)]
pub struct UpdateExpenseCmd {
    pub expense_id: ExpenseId,
    pub description: String,
    pub amount: MoneyCents,
    pub group_id: GroupId,
    pub payers: Vec<Share>,
    pub splits: Vec<Share>,
    pub acting_member: MemberId,
}

impl UpdateExpenseCmd {
    #[must_use]
    pub fn new(
        expense_id: ExpenseId,
        group_id: GroupId,
        acting_member: MemberId,
        description: impl Into<String>,
        amount: impl Into<MoneyCents>,
    ) -> Self {
        Self {
            expense_id,
            description: description.into(),
            amount: amount.into(),
            group_id,
            payers: Vec::new(),
            splits: Vec::new(),
            acting_member,
        }
    }

    #[must_use]
    pub fn payer(mut self, member_id: MemberId, amount: impl Into<MoneyCents>) -> Self {
        self.payers.push(Share::new(member_id, amount));
        self
    }

    #[must_use]
    pub fn split(mut self, member_id: MemberId, amount: impl Into<MoneyCents>) -> Self {
        self.splits.push(Share::new(member_id, amount));
        self
    }

    #[must_use]
    pub fn payers(mut self, payers: Vec<Share>) -> Self {
        self.payers = payers;
        self
    }

    #[must_use]
    pub fn splits(mut self, splits: Vec<Share>) -> Self {
        self.splits = splits;
        self
    }
}

/// Create a group.
#[derive(Clone, Debug)]
pub struct NewGroupCmd {
    pub name: String,
    pub member_ids: Vec<MemberId>,
}

impl NewGroupCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, member_ids: Vec<MemberId>) -> Self {
        Self {
            name: name.into(),
            member_ids,
        }
    }
}

/// Placeholder member invited by email while updating a group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtraMember {
    pub name: String,
    pub email: String,
}

/// Rename a group and replace its member set.
///
/// `member_ids` is the complete new set of existing members; `extra_members`
/// are created as unregistered members and added on top.
#[derive(Clone, Debug)]
pub struct UpdateGroupCmd {
    pub group_id: GroupId,
    pub name: String,
    pub member_ids: Vec<MemberId>,
    pub extra_members: Vec<ExtraMember>,
}

impl UpdateGroupCmd {
    #[must_use]
    pub fn new(group_id: GroupId, name: impl Into<String>, member_ids: Vec<MemberId>) -> Self {
        Self {
            group_id,
            name: name.into(),
            member_ids,
            extra_members: Vec::new(),
        }
    }

    #[must_use]
    pub fn extra_member(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.extra_members.push(ExtraMember {
            name: name.into(),
            email: email.into(),
        });
        self
    }
}
