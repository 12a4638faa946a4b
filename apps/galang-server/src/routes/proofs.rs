use axum::{extract::State, http::StatusCode, Json};
use galang_core::NewProof;
use galang_entities::proofs;
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery, AuthUser},
    state::AppState,
};

#[derive(Deserialize)]
pub struct ProofQuery {
    campaign_id: i32,
}

pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<ProofQuery>,
) -> AppResult<Json<Vec<proofs::Model>>> {
    Ok(Json(state.platform.proofs.list(query.campaign_id).await?))
}

pub async fn add_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    AppJson(new): AppJson<NewProof>,
) -> AppResult<(StatusCode, Json<proofs::Model>)> {
    let proof = state.platform.proofs.add(&actor, new).await?;
    Ok((StatusCode::CREATED, Json(proof)))
}

pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    AppPath(id): AppPath<i32>,
) -> AppResult<StatusCode> {
    state.platform.proofs.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
