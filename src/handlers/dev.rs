use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Deserialize)]
pub struct DevMessage {
    pub from_phone: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct DevResponse {
    pub reply: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs the dialogue without delivering the reply over WhatsApp.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DevMessage>,
) -> Json<DevResponse> {
    let from = payload.from_phone.trim();

    match state.engine.reply_to(from, &payload.message).await {
        Ok(reply) => Json(DevResponse {
            reply: reply.unwrap_or_default(),
            success: true,
            error: None,
        }),
        Err(e) => {
            tracing::error!(error = %e, from = %from, "dev message processing failed");
            Json(DevResponse {
                reply: String::new(),
                success: false,
                error: Some(e.to_string()),
            })
        }
    }
}
