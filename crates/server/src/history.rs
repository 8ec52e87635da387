use api_types::history::HistoryResponse;
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use engine::ExpenseId;

use crate::{ServerError, server::CurrentMember, server::ServerState, views};

/// Change log of every group the caller belongs to.
pub async fn history_mine(
    Extension(CurrentMember(member_id)): Extension<CurrentMember>,
    State(state): State<ServerState>,
) -> Result<Json<HistoryResponse>, ServerError> {
    let entries = state.engine.history_for_member(member_id).await?;
    Ok(Json(HistoryResponse {
        entries: entries.iter().map(views::history_entry).collect(),
    }))
}

pub async fn expense_history(
    State(state): State<ServerState>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<Json<HistoryResponse>, ServerError> {
    let entries = state.engine.history_for_expense(expense_id).await?;
    Ok(Json(HistoryResponse {
        entries: entries.iter().map(views::history_entry).collect(),
    }))
}
