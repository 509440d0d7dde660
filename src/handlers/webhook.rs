use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookChange {
    pub field: String,
    #[serde(default)]
    pub value: WebhookValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookValue {
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
}

#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    pub from: String,
    pub text: Option<TextBody>,
}

#[derive(Debug, Deserialize)]
pub struct TextBody {
    pub body: String,
}

impl WebhookPayload {
    /// `(sender, text)` pairs in delivery order. Non-text and empty messages
    /// are skipped.
    pub fn text_messages(&self) -> Vec<(String, String)> {
        if self.object != "whatsapp_business_account" {
            return Vec::new();
        }
        self.entry
            .iter()
            .flat_map(|entry| &entry.changes)
            .filter(|change| change.field == "messages")
            .flat_map(|change| &change.value.messages)
            .filter_map(|message| {
                let text = message.text.as_ref()?.body.trim();
                (!text.is_empty()).then(|| (message.from.trim().to_string(), text.to_string()))
            })
            .collect()
    }
}

fn validate_signature(app_secret: &str, header: &str, body: &[u8]) -> bool {
    let Some(expected) = header
        .strip_prefix("sha256=")
        .and_then(|hex_sig| hex::decode(hex_sig).ok())
    else {
        return false;
    };

    let mut mac = match Hmac::<Sha256>::new_from_slice(app_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

// GET /webhook
pub async fn verify_webhook(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyQuery>,
) -> Response {
    let expected = &state.config.whatsapp_verify_token;
    let token_matches =
        !expected.is_empty() && query.verify_token.as_deref() == Some(expected.as_str());

    if query.mode.is_some() && token_matches {
        tracing::info!("webhook subscription verified");
        (StatusCode::OK, query.challenge.unwrap_or_default()).into_response()
    } else {
        tracing::warn!("webhook verification rejected");
        StatusCode::FORBIDDEN.into_response()
    }
}

// POST /webhook
pub async fn whatsapp_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, AppError> {
    // Signature check is skipped when no app secret is configured (dev mode)
    if !state.config.whatsapp_app_secret.is_empty() {
        let signature = headers
            .get("x-hub-signature-256")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !validate_signature(&state.config.whatsapp_app_secret, signature, &body) {
            tracing::warn!("invalid or missing X-Hub-Signature-256");
            return Err(AppError::Forbidden);
        }
    }

    let payload: WebhookPayload =
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(e.to_string()))?;

    for (from, text) in payload.text_messages() {
        tracing::info!(from = %from, body = %text, "incoming WhatsApp message");
        state.engine.on_message(&from, &text).await;
    }

    Ok("OK")
}
