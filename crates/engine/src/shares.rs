//! Expense shares.
//!
//! A [`Share`] ties a member to part of an [`Expense`](crate::Expense):
//! - a *payer* share is money the member contributed toward the expense
//! - a *split* share is money the member owes for the expense
//!
//! Both kinds live in the same table, discriminated by `kind`. Shares are
//! never edited in place: updating an expense deletes all of its shares and
//! inserts the new ones.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, MemberId, MoneyCents};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ShareKind {
    Payer,
    Split,
}

impl ShareKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Payer => "payer",
            Self::Split => "split",
        }
    }
}

impl TryFrom<&str> for ShareKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "payer" => Ok(Self::Payer),
            "split" => Ok(Self::Split),
            other => Err(EngineError::InvalidShares(format!(
                "invalid share kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub member_id: MemberId,
    pub amount: MoneyCents,
}

impl Share {
    pub fn new(member_id: MemberId, amount: impl Into<MoneyCents>) -> Self {
        Self {
            member_id,
            amount: amount.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_shares")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub expense_id: i64,
    pub kind: String,
    pub member_id: i64,
    pub amount_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Expenses,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn for_share(expense_id: i64, kind: ShareKind, share: &Share) -> Self {
        Self {
            id: ActiveValue::NotSet,
            expense_id: ActiveValue::Set(expense_id),
            kind: ActiveValue::Set(kind.as_str().to_string()),
            member_id: ActiveValue::Set(share.member_id),
            amount_minor: ActiveValue::Set(share.amount.cents()),
        }
    }
}

impl Model {
    pub(crate) fn share_kind(&self) -> Result<ShareKind, EngineError> {
        ShareKind::try_from(self.kind.as_str())
    }
}

impl From<&Model> for Share {
    fn from(model: &Model) -> Self {
        Share::new(model.member_id, model.amount_minor)
    }
}
