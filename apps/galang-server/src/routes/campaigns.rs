use axum::{extract::State, http::StatusCode, Json};
use galang_core::{CampaignFilter, CampaignPatch, NewCampaign, Page};
use galang_entities::campaigns;
use std::sync::Arc;

use crate::{
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery, AuthUser},
    state::AppState,
};

pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    AppQuery(filter): AppQuery<CampaignFilter>,
) -> AppResult<Json<Page<campaigns::Model>>> {
    Ok(Json(state.platform.campaigns.list(&filter).await?))
}

pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    AppJson(new): AppJson<NewCampaign>,
) -> AppResult<(StatusCode, Json<campaigns::Model>)> {
    let campaign = state.platform.campaigns.create(&actor, new).await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<campaigns::Model>> {
    Ok(Json(state.platform.campaigns.get(id).await?))
}

pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    AppPath(id): AppPath<i32>,
    AppJson(patch): AppJson<CampaignPatch>,
) -> AppResult<Json<campaigns::Model>> {
    Ok(Json(state.platform.campaigns.update(&actor, id, patch).await?))
}

pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    AppPath(id): AppPath<i32>,
) -> AppResult<StatusCode> {
    state.platform.campaigns.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn end_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<campaigns::Model>> {
    Ok(Json(state.platform.campaigns.end(&actor, id).await?))
}

pub async fn implemented_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<campaigns::Model>> {
    Ok(Json(state.platform.campaigns.mark_implemented(&actor, id).await?))
}
