use axum::{
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
    Json,
};
use galang_core::{Balances, Page, PageRequest, PlatformStats, Recomputed};
use galang_entities::{users, withdrawals, Role, WithdrawalStatus};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::{
    error::AppResult,
    extract::{AdminUser, AppJson, AppPath, AppQuery},
    state::AppState,
};

#[derive(Deserialize)]
pub struct RoleChange {
    role: Role,
}

#[derive(Deserialize)]
pub struct WithdrawalQuery {
    status: Option<WithdrawalStatus>,
}

#[derive(Deserialize)]
pub struct Rejection {
    note: Option<String>,
}

#[derive(Deserialize)]
pub struct ExportQuery {
    campaign_id: Option<i32>,
}

pub async fn users_handler(
    State(state): State<Arc<AppState>>,
    AdminUser(actor): AdminUser,
    AppQuery(page): AppQuery<PageRequest>,
) -> AppResult<Json<Page<users::Model>>> {
    Ok(Json(state.platform.accounts.list_users(&actor, page).await?))
}

pub async fn role_handler(
    State(state): State<Arc<AppState>>,
    AdminUser(actor): AdminUser,
    AppPath(user_id): AppPath<i32>,
    AppJson(change): AppJson<RoleChange>,
) -> AppResult<Json<users::Model>> {
    let user = state
        .platform
        .accounts
        .set_role(&actor, user_id, change.role)
        .await?;
    Ok(Json(user))
}

pub async fn recompute_user_handler(
    State(state): State<Arc<AppState>>,
    AdminUser(actor): AdminUser,
    AppPath(user_id): AppPath<i32>,
) -> AppResult<Json<Recomputed<Balances>>> {
    Ok(Json(state.platform.funds.recompute_user(&actor, user_id).await?))
}

pub async fn recompute_campaign_handler(
    State(state): State<Arc<AppState>>,
    AdminUser(actor): AdminUser,
    AppPath(campaign_id): AppPath<i32>,
) -> AppResult<Json<Recomputed<i64>>> {
    let recomputed = state
        .platform
        .funds
        .recompute_campaign(&actor, campaign_id)
        .await?;
    Ok(Json(recomputed))
}

pub async fn withdrawals_handler(
    State(state): State<Arc<AppState>>,
    AdminUser(actor): AdminUser,
    AppQuery(query): AppQuery<WithdrawalQuery>,
) -> AppResult<Json<Vec<withdrawals::Model>>> {
    let withdrawals = state
        .platform
        .funds
        .list_all_withdrawals(&actor, query.status)
        .await?;
    Ok(Json(withdrawals))
}

pub async fn approve_handler(
    State(state): State<Arc<AppState>>,
    AdminUser(actor): AdminUser,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<withdrawals::Model>> {
    Ok(Json(state.platform.funds.approve(&actor, id).await?))
}

/// The body is optional; `{"note": "..."}` records why.
pub async fn reject_handler(
    State(state): State<Arc<AppState>>,
    AdminUser(actor): AdminUser,
    AppPath(id): AppPath<i32>,
    body: Option<AppJson<Rejection>>,
) -> AppResult<Json<withdrawals::Model>> {
    let note = body.and_then(|AppJson(rejection)| rejection.note);
    Ok(Json(state.platform.funds.reject(&actor, id, note).await?))
}

pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
    AdminUser(actor): AdminUser,
) -> AppResult<Json<PlatformStats>> {
    Ok(Json(state.platform.reports.stats(&actor).await?))
}

pub async fn export_handler(
    State(state): State<Arc<AppState>>,
    AdminUser(actor): AdminUser,
    AppQuery(query): AppQuery<ExportQuery>,
) -> AppResult<impl IntoResponse> {
    let mut csv = Vec::new();
    let rows = state
        .platform
        .reports
        .export_donations_csv(&actor, query.campaign_id, &mut csv)
        .await?;
    info!(rows, campaign_id = ?query.campaign_id, "Exported donations");

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                CONTENT_DISPOSITION,
                "attachment; filename=\"donations.csv\"",
            ),
        ],
        csv,
    ))
}
