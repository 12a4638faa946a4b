use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use galang_core::{InvoiceOutcome, NewDonation, PublicDonation};
use galang_entities::donations;
use galang_xendit::InvoiceCallback;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::{
    error::AppResult,
    extract::{AppJson, AppPath, AuthUser},
    state::AppState,
};

pub const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

#[derive(Serialize)]
pub struct CallbackAck {
    donation_external_id: String,
    outcome: InvoiceOutcome,
}

pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    AppJson(new): AppJson<NewDonation>,
) -> AppResult<(StatusCode, Json<donations::Model>)> {
    let donation = state.platform.donations.create(&actor, new).await?;
    Ok((StatusCode::CREATED, Json(donation)))
}

pub async fn mine_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> AppResult<Json<Vec<donations::Model>>> {
    Ok(Json(state.platform.donations.list_mine(&actor).await?))
}

pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<donations::Model>> {
    Ok(Json(state.platform.donations.get(&actor, id).await?))
}

pub async fn campaign_handler(
    State(state): State<Arc<AppState>>,
    AppPath(campaign_id): AppPath<i32>,
) -> AppResult<Json<Vec<PublicDonation>>> {
    Ok(Json(
        state
            .platform
            .donations
            .list_for_campaign(campaign_id)
            .await?,
    ))
}

/// Xendit invoice callback. Authenticated by `x-callback-token`, not a session.
pub async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppJson(callback): AppJson<InvoiceCallback>,
) -> AppResult<Json<CallbackAck>> {
    let token = headers
        .get(CALLBACK_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let outcome = state
        .platform
        .donations
        .handle_callback(token, &callback)
        .await?;
    info!(
        external_id = %callback.external_id,
        ?outcome,
        "Invoice callback handled"
    );

    Ok(Json(CallbackAck {
        donation_external_id: callback.external_id,
        outcome,
    }))
}
