use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::conversation::ConversationEngine;
use crate::store::{AppointmentStore, SalonConfigStore};

pub struct AppState {
    pub config: AppConfig,
    pub salon: Arc<SalonConfigStore>,
    pub appointments: Arc<dyn AppointmentStore>,
    pub engine: Arc<ConversationEngine>,
}
