use axum::{
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::state::AppState;

mod admin;
mod auth;
mod campaigns;
mod donations;
mod funds;
mod proofs;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/me", get(auth::me_handler))
        .route("/auth/me/xendit", put(auth::xendit_keys_handler))
        .route(
            "/campaigns",
            get(campaigns::list_handler).post(campaigns::create_handler),
        )
        .route(
            "/campaigns/:id",
            get(campaigns::get_handler)
                .patch(campaigns::update_handler)
                .delete(campaigns::delete_handler),
        )
        .route("/campaigns/:id/end", post(campaigns::end_handler))
        .route(
            "/campaigns/:id/implemented",
            post(campaigns::implemented_handler),
        )
        .route("/campaigns/:id/donations", get(donations::campaign_handler))
        .route("/donations", post(donations::create_handler))
        .route("/donations/mine", get(donations::mine_handler))
        .route("/donations/webhook", post(donations::webhook_handler))
        .route("/donations/:id", get(donations::get_handler))
        .route("/funds", get(funds::summary_handler))
        .route(
            "/funds/withdrawals",
            get(funds::list_handler).post(funds::request_handler),
        )
        .route(
            "/proofs",
            get(proofs::list_handler).post(proofs::add_handler),
        )
        .route("/proofs/:id", delete(proofs::delete_handler))
        .route("/admin/users", get(admin::users_handler))
        .route("/admin/users/:id/role", patch(admin::role_handler))
        .route(
            "/admin/users/:id/recompute",
            post(admin::recompute_user_handler),
        )
        .route(
            "/admin/campaigns/:id/recompute",
            post(admin::recompute_campaign_handler),
        )
        .route("/admin/withdrawals", get(admin::withdrawals_handler))
        .route(
            "/admin/withdrawals/:id/approve",
            post(admin::approve_handler),
        )
        .route("/admin/withdrawals/:id/reject", post(admin::reject_handler))
        .route("/admin/stats", get(admin::stats_handler))
        .route("/admin/donations/export", get(admin::export_handler))
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
