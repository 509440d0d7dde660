pub mod admin;
pub mod dev;
pub mod health;
pub mod webhook;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/webhook",
            get(webhook::verify_webhook).post(webhook::whatsapp_webhook),
        )
        .route("/api/status", get(admin::get_status))
        .route("/api/appointments", get(admin::get_appointments))
        .route(
            "/api/config",
            get(admin::get_config).post(admin::update_config),
        )
        .route("/api/dev/message", post(dev::send_message))
        .with_state(state)
}
