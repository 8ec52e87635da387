//! Groups API endpoints.

use api_types::{
    debts::GroupDebtsResponse,
    group::{GroupNew, GroupUpdate, GroupView, GroupsResponse},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{ExtraMember, GroupId, NewGroupCmd, UpdateGroupCmd};

use crate::{ServerError, server::CurrentMember, server::ServerState, views};

pub async fn group_new(
    State(state): State<ServerState>,
    Json(payload): Json<GroupNew>,
) -> Result<(StatusCode, Json<GroupView>), ServerError> {
    let group = state
        .engine
        .create_group(NewGroupCmd::new(payload.name, payload.member_ids))
        .await?;
    Ok((StatusCode::CREATED, Json(views::group(&group))))
}

pub async fn group_update(
    State(state): State<ServerState>,
    Path(group_id): Path<GroupId>,
    Json(payload): Json<GroupUpdate>,
) -> Result<Json<GroupView>, ServerError> {
    let mut cmd = UpdateGroupCmd::new(group_id, payload.name, payload.member_ids);
    cmd.extra_members = payload
        .extra_members
        .into_iter()
        .map(|extra| ExtraMember {
            name: extra.name,
            email: extra.email,
        })
        .collect();

    let group = state.engine.update_group(cmd).await?;
    Ok(Json(views::group(&group)))
}

/// Groups the caller belongs to.
pub async fn groups_list(
    Extension(CurrentMember(member_id)): Extension<CurrentMember>,
    State(state): State<ServerState>,
) -> Result<Json<GroupsResponse>, ServerError> {
    let groups = state.engine.groups_for_member(member_id).await?;
    Ok(Json(GroupsResponse {
        groups: groups.iter().map(views::group).collect(),
    }))
}

pub async fn group_debts(
    Extension(CurrentMember(member_id)): Extension<CurrentMember>,
    State(state): State<ServerState>,
    Path(group_id): Path<GroupId>,
) -> Result<Json<GroupDebtsResponse>, ServerError> {
    let debts = state.engine.group_debts(group_id, member_id).await?;
    Ok(Json(views::group_debts(debts)))
}
