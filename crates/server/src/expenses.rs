//! Expenses API endpoints.

use api_types::{
    debts::{BalancesResponse, SettlementsResponse},
    expense::{ExpenseView, ExpenseWrite, ExpensesResponse, GroupQuery},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{ExpenseId, NewExpenseCmd, UpdateExpenseCmd};

use crate::{ServerError, server::CurrentMember, server::ServerState, views};

pub async fn expense_new(
    Extension(CurrentMember(member_id)): Extension<CurrentMember>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseWrite>,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    let cmd = NewExpenseCmd::new(
        payload.group_id,
        member_id,
        payload.description,
        payload.amount_minor,
    )
    .payers(views::to_shares(&payload.payers))
    .splits(views::to_shares(&payload.splits));

    let expense = state.engine.create_expense(cmd).await?;
    Ok((StatusCode::CREATED, Json(views::expense(&expense))))
}

pub async fn expenses_list(
    State(state): State<ServerState>,
    Query(query): Query<GroupQuery>,
) -> Result<Json<ExpensesResponse>, ServerError> {
    let expenses = state.engine.group_expenses(query.group_id).await?;
    Ok(Json(ExpensesResponse {
        expenses: expenses.iter().map(views::expense).collect(),
    }))
}

/// Expenses of every group the caller belongs to, newest first.
pub async fn expenses_mine(
    Extension(CurrentMember(member_id)): Extension<CurrentMember>,
    State(state): State<ServerState>,
) -> Result<Json<ExpensesResponse>, ServerError> {
    let expenses = state.engine.member_expenses(member_id).await?;
    Ok(Json(ExpensesResponse {
        expenses: expenses.iter().map(views::expense).collect(),
    }))
}

pub async fn expense_update(
    Extension(CurrentMember(member_id)): Extension<CurrentMember>,
    State(state): State<ServerState>,
    Path(expense_id): Path<ExpenseId>,
    Json(payload): Json<ExpenseWrite>,
) -> Result<Json<ExpenseView>, ServerError> {
    let cmd = UpdateExpenseCmd::new(
        expense_id,
        payload.group_id,
        member_id,
        payload.description,
        payload.amount_minor,
    )
    .payers(views::to_shares(&payload.payers))
    .splits(views::to_shares(&payload.splits));

    let expense = state.engine.update_expense(cmd).await?;
    Ok(Json(views::expense(&expense)))
}

pub async fn expense_delete(
    Extension(CurrentMember(member_id)): Extension<CurrentMember>,
    State(state): State<ServerState>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_expense(expense_id, member_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn expenses_balance(
    State(state): State<ServerState>,
    Query(query): Query<GroupQuery>,
) -> Result<Json<BalancesResponse>, ServerError> {
    let balances = state.engine.balances(query.group_id).await?;
    Ok(Json(BalancesResponse {
        balances: balances.iter().map(views::balance).collect(),
    }))
}

pub async fn expenses_settlements(
    State(state): State<ServerState>,
    Query(query): Query<GroupQuery>,
) -> Result<Json<SettlementsResponse>, ServerError> {
    let transactions = state.engine.settlements(query.group_id).await?;
    Ok(Json(SettlementsResponse {
        transactions: transactions.iter().map(views::settlement).collect(),
    }))
}
