use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::salon::{SalonConfig, Service};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStep {
    Initial,
    ConfirmBooking,
    SelectService,
    SelectStaff,
    SelectDateTime,
    ConfirmAppointment,
}

impl ConversationStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStep::Initial => "initial",
            ConversationStep::ConfirmBooking => "confirm_booking",
            ConversationStep::SelectService => "select_service",
            ConversationStep::SelectStaff => "select_staff",
            ConversationStep::SelectDateTime => "select_date_time",
            ConversationStep::ConfirmAppointment => "confirm_appointment",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PendingAppointment {
    pub service: Option<Service>,
    pub staff: Option<String>,
    pub date_formatted: Option<String>,
    pub time: Option<String>,
    pub iso_date_time: Option<NaiveDateTime>,
}

impl PendingAppointment {
    pub fn clear_slot(&mut self) {
        self.date_formatted = None;
        self.time = None;
        self.iso_date_time = None;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationState {
    pub step: ConversationStep,
    pub pending: PendingAppointment,
    pub last_activity: NaiveDateTime,
    /// Salon config the dialogue started with. Admin overrides only reach
    /// conversations started after them.
    #[serde(skip)]
    pub salon: Option<Arc<SalonConfig>>,
}

impl ConversationState {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            step: ConversationStep::Initial,
            pending: PendingAppointment::default(),
            last_activity: now,
            salon: None,
        }
    }

    pub fn is_idle(&self, now: NaiveDateTime, timeout: Duration) -> bool {
        now - self.last_activity > timeout
    }
}
