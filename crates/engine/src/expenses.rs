//! Expenses and their payer/split shares.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    ExpenseSnapshot, GroupId, MoneyCents, ResultEngine, Share,
    shares::{self, ShareKind},
};

pub type ExpenseId = i64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    pub amount: MoneyCents,
    pub group_id: GroupId,
    pub created_at: DateTime<Utc>,
    pub payers: Vec<Share>,
    pub splits: Vec<Share>,
}

impl Expense {
    /// Builds the domain value from its row and its share rows.
    ///
    /// Shares keep insertion order (ascending share id).
    pub(crate) fn from_models(model: Model, mut share_models: Vec<shares::Model>) -> ResultEngine<Self> {
        share_models.sort_by_key(|s| s.id);
        let mut payers = Vec::new();
        let mut splits = Vec::new();
        for share in &share_models {
            match share.share_kind()? {
                ShareKind::Payer => payers.push(Share::from(share)),
                ShareKind::Split => splits.push(Share::from(share)),
            }
        }
        Ok(Self {
            id: model.id,
            description: model.description,
            amount: MoneyCents::new(model.amount_minor),
            group_id: model.group_id,
            created_at: model.created_at,
            payers,
            splits,
        })
    }

    pub fn total_paid(&self) -> MoneyCents {
        self.payers.iter().map(|s| s.amount).sum()
    }

    pub fn total_split(&self) -> MoneyCents {
        self.splits.iter().map(|s| s.amount).sum()
    }

    pub fn snapshot(&self) -> ExpenseSnapshot {
        ExpenseSnapshot {
            description: self.description.clone(),
            amount: self.amount,
            group_id: self.group_id,
            payers: self.payers.clone(),
            splits: self.splits.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub description: String,
    pub amount_minor: i64,
    pub group_id: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Groups,
    #[sea_orm(has_many = "super::shares::Entity")]
    Shares,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::shares::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shares.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
