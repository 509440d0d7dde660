use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::salon::Service;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaffRef {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: i64,
    pub phone: String,
    /// DD/MM/YYYY
    pub date_formatted: String,
    /// HH:MM
    pub time: String,
    pub iso_date_time: NaiveDateTime,
    pub service: Service,
    pub staff: StaffRef,
    pub created_at: NaiveDateTime,
}

impl Appointment {
    pub fn is_at(&self, date: NaiveDate, time: NaiveTime) -> bool {
        self.date_formatted == format_date(date) && self.time == format_time(time)
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Issues appointment ids from creation timestamps (milliseconds), always
/// strictly above every id issued or loaded before.
#[derive(Debug, Default)]
pub struct AppointmentIds {
    last: AtomicI64,
}

impl AppointmentIds {
    pub fn seeded(existing: &[Appointment]) -> Self {
        let last = existing.iter().map(|a| a.id).max().unwrap_or(0);
        Self {
            last: AtomicI64::new(last),
        }
    }

    pub fn next(&self, created_at: NaiveDateTime) -> i64 {
        let candidate = created_at.and_utc().timestamp_millis();
        let previous = match self.last.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(candidate.max(last + 1))
        }) {
            Ok(prev) | Err(prev) => prev,
        };
        candidate.max(previous + 1)
    }
}
