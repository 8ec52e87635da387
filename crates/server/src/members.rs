//! Member registration and lookup.

use api_types::member::{MemberCreated, MemberNew, MemberView};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::MemberId;

use crate::{ServerError, server::ServerState, views};

/// Registers a member and hands back a bearer token for it.
pub async fn member_new(
    State(state): State<ServerState>,
    Json(payload): Json<MemberNew>,
) -> Result<(StatusCode, Json<MemberCreated>), ServerError> {
    let member = state
        .engine
        .new_member(&payload.name, payload.email.as_deref())
        .await?;
    let token = state.jwt.issue(member.id).map_err(|err| {
        tracing::error!("failed to sign token for member {}: {err}", member.id);
        ServerError::Generic("cannot issue token".to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(MemberCreated {
            member: views::member(&member),
            token,
        }),
    ))
}

pub async fn member_get(
    State(state): State<ServerState>,
    Path(member_id): Path<MemberId>,
) -> Result<Json<MemberView>, ServerError> {
    let member = state.engine.member(member_id).await?;
    Ok(Json(views::member(&member)))
}
