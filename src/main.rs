use std::sync::Arc;
use std::time::Duration;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use salonbot::config::AppConfig;
use salonbot::handlers;
use salonbot::services::clock::SystemClock;
use salonbot::services::conversation::ConversationEngine;
use salonbot::services::messaging::whatsapp::WhatsAppCloudProvider;
use salonbot::state::AppState;
use salonbot::store::{
    AppointmentStore, InMemoryConversationStore, JsonFileAppointmentStore, SalonConfigStore,
};

const PURGE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let salon = Arc::new(SalonConfigStore::load(&config.salon_config_path).await?);
    let appointments: Arc<dyn AppointmentStore> =
        Arc::new(JsonFileAppointmentStore::open(&config.appointments_path).await);

    if config.whatsapp_access_token.is_empty() {
        tracing::warn!("WHATSAPP_ACCESS_TOKEN not set, replies will fail to send");
    }
    let messaging = WhatsAppCloudProvider::new(
        config.whatsapp_api_version.clone(),
        config.whatsapp_phone_number_id.clone(),
        config.whatsapp_access_token.clone(),
    );

    let engine = Arc::new(
        ConversationEngine::new(
            salon.clone(),
            appointments.clone(),
            Arc::new(InMemoryConversationStore::default()),
            Arc::new(messaging),
            Arc::new(SystemClock),
            chrono::Duration::minutes(config.conversation_timeout_minutes),
        )
        .await?,
    );

    let purge_engine = engine.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            match purge_engine.expire_idle_conversations().await {
                Ok(0) => {}
                Ok(count) => tracing::info!(count, "expired idle conversations"),
                Err(e) => tracing::error!(error = %e, "failed to expire idle conversations"),
            }
        }
    });

    tracing::info!(
        salon = %salon.snapshot().name,
        status = if engine.is_open_now() { "OPEN" } else { "CLOSED" },
        "salon loaded"
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        salon,
        appointments,
        engine,
    });

    let app = handlers::router(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
