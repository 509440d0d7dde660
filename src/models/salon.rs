use std::collections::BTreeSet;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::intent::Vocabulary;

/// Staff value recorded when the customer has no preference.
pub const ANY_STAFF: &str = "Indiferente";

const WEEKDAY_NAMES: [&str; 7] = ["Dom", "Lun", "Mar", "Mié", "Jue", "Vie", "Sáb"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub name: String,
    pub price: f64,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaffMember {
    pub name: String,
    pub specialty: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalonConfig {
    pub name: String,
    #[serde(with = "hh_mm")]
    pub open_time: NaiveTime,
    #[serde(with = "hh_mm")]
    pub close_time: NaiveTime,
    /// 0 = Sunday.
    pub working_days: BTreeSet<u8>,
    pub services: Vec<Service>,
    pub staff: Vec<StaffMember>,
    #[serde(default)]
    pub vocabulary: Vocabulary,
}

impl SalonConfig {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let config: SalonConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.open_time < self.close_time,
            "open_time {} must be before close_time {}",
            self.open_time.format("%H:%M"),
            self.close_time.format("%H:%M")
        );
        if let Some(day) = self.working_days.iter().find(|d| **d > 6) {
            anyhow::bail!("invalid working day: {day} (expected 0-6)");
        }
        anyhow::ensure!(!self.services.is_empty(), "at least one service is required");
        anyhow::ensure!(!self.staff.is_empty(), "at least one staff member is required");
        for service in &self.services {
            anyhow::ensure!(
                service.price >= 0.0,
                "service {} has a negative price",
                service.name
            );
            anyhow::ensure!(
                service.duration_minutes > 0,
                "service {} must last at least one minute",
                service.name
            );
        }
        Ok(())
    }

    pub fn hours_label(&self) -> String {
        format!(
            "{} - {}",
            self.open_time.format("%H:%M"),
            self.close_time.format("%H:%M")
        )
    }

    pub fn working_days_label(&self) -> String {
        self.working_days
            .iter()
            .filter_map(|d| WEEKDAY_NAMES.get(*d as usize))
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for SalonConfig {
    fn default() -> Self {
        Self {
            name: "Salón Bella".to_string(),
            open_time: NaiveTime::from_hms_opt(9, 0, 0).expect("09:00 is a valid time"),
            close_time: NaiveTime::from_hms_opt(20, 0, 0).expect("20:00 is a valid time"),
            working_days: [1, 2, 3, 4, 5, 6].into_iter().collect(),
            services: vec![
                Service {
                    name: "Corte de pelo".to_string(),
                    price: 15.0,
                    duration_minutes: 30,
                },
                Service {
                    name: "Tinte".to_string(),
                    price: 35.0,
                    duration_minutes: 90,
                },
                Service {
                    name: "Peinado".to_string(),
                    price: 20.0,
                    duration_minutes: 45,
                },
            ],
            staff: vec![
                StaffMember {
                    name: "María".to_string(),
                    specialty: "Color".to_string(),
                },
                StaffMember {
                    name: "Carlos".to_string(),
                    specialty: "Cortes".to_string(),
                },
            ],
            vocabulary: Vocabulary::default(),
        }
    }
}

pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{price:.0}")
    } else {
        format!("{price:.2}")
    }
}

mod hh_mm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map_err(|_| serde::de::Error::custom(format!("invalid HH:MM time: {s}")))
    }
}
