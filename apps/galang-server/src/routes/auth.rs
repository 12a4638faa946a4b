use axum::{extract::State, http::StatusCode, Json};
use galang_core::{LoginSession, Registration, XenditKeys};
use galang_entities::users;
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    extract::{AppJson, AuthUser, BearerToken},
    state::AppState,
};

#[derive(Deserialize)]
pub struct Credentials {
    email: String,
    password: String,
}

pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    AppJson(registration): AppJson<Registration>,
) -> AppResult<(StatusCode, Json<users::Model>)> {
    let user = state.platform.accounts.register(registration).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    AppJson(credentials): AppJson<Credentials>,
) -> AppResult<Json<LoginSession>> {
    let session = state
        .platform
        .accounts
        .login(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(session))
}

pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
) -> AppResult<StatusCode> {
    state.platform.accounts.logout(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> AppResult<Json<users::Model>> {
    Ok(Json(state.platform.accounts.profile(actor.user_id).await?))
}

pub async fn xendit_keys_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    AppJson(keys): AppJson<XenditKeys>,
) -> AppResult<Json<users::Model>> {
    let user = state.platform.accounts.set_xendit_keys(&actor, keys).await?;
    Ok(Json(user))
}
