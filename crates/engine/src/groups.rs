//! Groups of members sharing expenses.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{Member, MemberId};

pub type GroupId = i64;

/// A group with its (non-empty) member set.
///
/// Members are kept sorted by id so two loads of the same group compare
/// equal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub members: Vec<Member>,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub(crate) fn from_models(model: Model, mut members: Vec<super::members::Model>) -> Self {
        members.sort_by_key(|m| m.id);
        Self {
            id: model.id,
            name: model.name,
            members: members.into_iter().map(Member::from).collect(),
            created_at: model.created_at,
        }
    }

    pub fn member_ids(&self) -> Vec<MemberId> {
        self.members.iter().map(|m| m.id).collect()
    }

    pub fn has_member(&self, member_id: MemberId) -> bool {
        self.members.iter().any(|m| m.id == member_id)
    }

    /// Display name of a member, `"Unknown"` when the member is not (or no
    /// longer) part of the group.
    pub fn member_name(&self, member_id: MemberId) -> &str {
        self.members
            .iter()
            .find(|m| m.id == member_id)
            .map(|m| m.name.as_str())
            .unwrap_or("Unknown")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_members::Entity")]
    GroupMembers,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::group_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GroupMembers.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        super::group_members::Relation::Members.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::group_members::Relation::Groups.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
