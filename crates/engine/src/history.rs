//! Expense audit history.
//!
//! Each create/update/delete of an expense appends one row. Rows are never
//! updated or deleted, and carry no cascading foreign key to `expenses`, so
//! the trail outlives the expense it describes. `group_id` is copied from the
//! expense at write time so member-scoped listings keep working after the
//! expense is gone.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, ExpenseId, GroupId, MemberId, MoneyCents, ResultEngine, Share};

pub type HistoryId = i64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Created,
    Updated,
    Deleted,
}

impl HistoryAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl TryFrom<&str> for HistoryAction {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "created" => Ok(Self::Created),
            "updated" => Ok(Self::Updated),
            "deleted" => Ok(Self::Deleted),
            other => Err(EngineError::InvalidInput(format!(
                "invalid history action: {other}"
            ))),
        }
    }
}

/// State of an expense at one point in time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseSnapshot {
    pub description: String,
    pub amount: MoneyCents,
    pub group_id: GroupId,
    pub payers: Vec<Share>,
    pub splits: Vec<Share>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: HistoryId,
    pub expense_id: ExpenseId,
    pub group_id: GroupId,
    pub member_id: MemberId,
    pub member_name: Option<String>,
    pub action: HistoryAction,
    pub previous: Option<ExpenseSnapshot>,
    pub current: Option<ExpenseSnapshot>,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub(crate) fn from_models(
        model: Model,
        actor: Option<super::members::Model>,
    ) -> ResultEngine<Self> {
        let parse = |value: Option<Json>| -> ResultEngine<Option<ExpenseSnapshot>> {
            value
                .map(serde_json::from_value::<ExpenseSnapshot>)
                .transpose()
                .map_err(Into::into)
        };
        Ok(Self {
            id: model.id,
            expense_id: model.expense_id,
            group_id: model.group_id,
            member_id: model.member_id,
            member_name: actor.map(|m| m.name),
            action: HistoryAction::try_from(model.action.as_str())?,
            previous: parse(model.previous_data)?,
            current: parse(model.new_data)?,
            created_at: model.created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub expense_id: i64,
    pub group_id: i64,
    pub member_id: i64,
    pub action: String,
    pub previous_data: Option<Json>,
    pub new_data: Option<Json>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::members::Entity",
        from = "Column::MemberId",
        to = "super::members::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Members,
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
