use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Appointment, SalonConfig};
use crate::state::AppState;

// GET /api/status
#[derive(Serialize)]
pub struct StatusResponse {
    salon: String,
    open: bool,
    active_conversations: usize,
    appointments: usize,
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, AppError> {
    let appointments = state.appointments.load_all().await?.len();
    let active_conversations = state.engine.active_conversations().await?;

    Ok(Json(StatusResponse {
        salon: state.salon.snapshot().name.clone(),
        open: state.engine.is_open_now(),
        active_conversations,
        appointments,
    }))
}

// GET /api/appointments
#[derive(Deserialize)]
pub struct AppointmentsQuery {
    /// DD/MM/YYYY
    pub date: Option<String>,
    pub phone: Option<String>,
}

pub async fn get_appointments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let appointments = state
        .appointments
        .load_all()
        .await?
        .into_iter()
        .filter(|a| query.date.as_deref().map_or(true, |d| a.date_formatted == d))
        .filter(|a| query.phone.as_deref().map_or(true, |p| a.phone == p))
        .collect();

    Ok(Json(appointments))
}

// GET /api/config
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SalonConfig> {
    Json(state.salon.snapshot().as_ref().clone())
}

// POST /api/config
pub async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(fragment): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    let updated = state.salon.merge(fragment).await?;
    Ok(Json(serde_json::json!({ "ok": true, "config": updated.as_ref() })))
}
