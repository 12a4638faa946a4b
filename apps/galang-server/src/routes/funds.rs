use axum::{extract::State, http::StatusCode, Json};
use galang_core::{FundsSummary, NewWithdrawal};
use galang_entities::withdrawals;
use std::sync::Arc;

use crate::{
    error::AppResult,
    extract::{AppJson, AuthUser},
    state::AppState,
};

pub async fn summary_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> AppResult<Json<FundsSummary>> {
    Ok(Json(state.platform.funds.summary(&actor).await?))
}

pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> AppResult<Json<Vec<withdrawals::Model>>> {
    Ok(Json(state.platform.funds.list_withdrawals(&actor).await?))
}

pub async fn request_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    AppJson(new): AppJson<NewWithdrawal>,
) -> AppResult<(StatusCode, Json<withdrawals::Model>)> {
    let withdrawal = state.platform.funds.request_withdrawal(&actor, new).await?;
    Ok((StatusCode::CREATED, Json(withdrawal)))
}
