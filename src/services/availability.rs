use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::models::{format_time, Appointment, SalonConfig, ANY_STAFF};

const SLOT_MINUTES: u32 = 30;
pub const SUGGESTION_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum SlotRejection {
    InPast,
    ClosedDay { days: String },
    OutsideHours { hours: String },
    Taken { suggestions: Vec<String> },
}

impl std::fmt::Display for SlotRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotRejection::InPast => {
                write!(
                    f,
                    "Esa fecha y hora ya han pasado ⏰ Por favor, elige un momento futuro (DD/MM/AAAA HH:MM)."
                )
            }
            SlotRejection::ClosedDay { days } => {
                write!(
                    f,
                    "Ese día no abrimos 📅 Trabajamos: {days}. ¿Qué otro día te viene bien?"
                )
            }
            SlotRejection::OutsideHours { hours } => {
                write!(
                    f,
                    "Esa hora está fuera de nuestro horario 🕐 Atendemos de {hours}. Elige otra hora, por favor."
                )
            }
            SlotRejection::Taken { suggestions } if suggestions.is_empty() => {
                write!(
                    f,
                    "Lo siento, ese horario ya está ocupado 😔 No quedan huecos libres ese día, prueba con otra fecha."
                )
            }
            SlotRejection::Taken { suggestions } => {
                write!(
                    f,
                    "Lo siento, ese horario ya está ocupado 😔 Horarios disponibles ese día: {}",
                    suggestions.join(", ")
                )
            }
        }
    }
}

/// Business-hours and calendar rules evaluated against one snapshot of the
/// salon config, the booked appointments and the current wall-clock time.
///
/// Opening hours are half-open at minute granularity: a salon open 09:00-20:00
/// accepts 19:59 but not 20:00.
pub struct AvailabilityChecker<'a> {
    salon: &'a SalonConfig,
    appointments: &'a [Appointment],
    now: NaiveDateTime,
}

impl<'a> AvailabilityChecker<'a> {
    pub fn new(salon: &'a SalonConfig, appointments: &'a [Appointment], now: NaiveDateTime) -> Self {
        Self {
            salon,
            appointments,
            now,
        }
    }

    pub fn is_open_now(&self) -> bool {
        self.is_working_day(self.now.date()) && self.is_within_working_hours(self.now.time())
    }

    pub fn is_in_past(&self, date: NaiveDate, time: NaiveTime) -> bool {
        date.and_time(time) < self.now
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        let weekday = date.weekday().num_days_from_sunday() as u8;
        self.salon.working_days.contains(&weekday)
    }

    pub fn is_within_working_hours(&self, time: NaiveTime) -> bool {
        let time = truncate_to_minute(time);
        time >= self.salon.open_time && time < self.salon.close_time
    }

    /// The "any staff" selection contends with every booking at that slot; a
    /// named staff member only with their own bookings.
    pub fn check_availability(&self, staff: &str, date: NaiveDate, time: NaiveTime) -> bool {
        !self
            .appointments
            .iter()
            .any(|a| a.is_at(date, time) && contends(staff, a))
    }

    /// Free half-hour slots for `staff` on `date`, earliest first. Slots that
    /// are already booked or already in the past are skipped.
    pub fn suggested_times(&self, staff: &str, date: NaiveDate, limit: usize) -> Vec<String> {
        let open = minutes_of_day(self.salon.open_time);
        let close = minutes_of_day(self.salon.close_time);
        let first = open - open % SLOT_MINUTES;

        (first..close)
            .step_by(SLOT_MINUTES as usize)
            .filter_map(|m| NaiveTime::from_hms_opt(m / 60, m % 60, 0))
            .filter(|t| self.is_within_working_hours(*t))
            .filter(|t| !self.is_in_past(date, *t))
            .filter(|t| self.check_availability(staff, date, *t))
            .take(limit)
            .map(format_time)
            .collect()
    }

    /// Runs the checks in a fixed order and reports only the first failure:
    /// past, then working day, then opening hours, then conflicts.
    pub fn validate_slot(
        &self,
        staff: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<(), SlotRejection> {
        if self.is_in_past(date, time) {
            return Err(SlotRejection::InPast);
        }
        if !self.is_working_day(date) {
            return Err(SlotRejection::ClosedDay {
                days: self.salon.working_days_label(),
            });
        }
        if !self.is_within_working_hours(time) {
            return Err(SlotRejection::OutsideHours {
                hours: self.salon.hours_label(),
            });
        }
        if !self.check_availability(staff, date, time) {
            return Err(SlotRejection::Taken {
                suggestions: self.suggested_times(staff, date, SUGGESTION_LIMIT),
            });
        }
        Ok(())
    }
}

fn contends(staff: &str, booked: &Appointment) -> bool {
    staff == ANY_STAFF || booked.staff.name == staff
}

fn minutes_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{format_date, Service, StaffRef};

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn booked(at: &str, staff: &str) -> Appointment {
        let iso = dt(at);
        Appointment {
            id: 1,
            phone: "999".to_string(),
            date_formatted: format_date(iso.date()),
            time: format_time(iso.time()),
            iso_date_time: iso,
            service: Service {
                name: "Corte de pelo".to_string(),
                price: 15.0,
                duration_minutes: 30,
            },
            staff: StaffRef {
                name: staff.to_string(),
            },
            created_at: dt("2031-06-01 08:00"),
        }
    }

    // 2031-06-16 is a Monday; the default salon works Mon-Sat 09:00-20:00.
    const NOW: &str = "2031-06-10 12:00";

    #[test]
    fn test_open_now_half_open_boundary() {
        let salon = SalonConfig::default();
        let open = |at: &str| AvailabilityChecker::new(&salon, &[], dt(at)).is_open_now();
        assert!(open("2031-06-16 09:00"));
        assert!(open("2031-06-16 19:59"));
        assert!(!open("2031-06-16 20:00"));
        assert!(!open("2031-06-16 08:59"));
        // Sunday
        assert!(!open("2031-06-15 12:00"));
    }

    #[test]
    fn test_is_in_past_is_strict() {
        let salon = SalonConfig::default();
        let checker = AvailabilityChecker::new(&salon, &[], dt(NOW));
        assert!(checker.is_in_past(date("2031-06-10"), time("11:59")));
        assert!(!checker.is_in_past(date("2031-06-10"), time("12:00")));
        assert!(!checker.is_in_past(date("2031-06-11"), time("09:00")));
    }

    #[test]
    fn test_working_day() {
        let salon = SalonConfig::default();
        let checker = AvailabilityChecker::new(&salon, &[], dt(NOW));
        assert!(checker.is_working_day(date("2031-06-16")));
        assert!(!checker.is_working_day(date("2031-06-15")));
    }

    #[test]
    fn test_within_working_hours() {
        let salon = SalonConfig::default();
        let checker = AvailabilityChecker::new(&salon, &[], dt(NOW));
        assert!(checker.is_within_working_hours(time("09:00")));
        assert!(checker.is_within_working_hours(time("19:30")));
        assert!(!checker.is_within_working_hours(time("20:00")));
        assert!(!checker.is_within_working_hours(time("08:30")));
    }

    #[test]
    fn test_named_staff_conflicts_only_with_own_bookings() {
        let salon = SalonConfig::default();
        let appointments = vec![booked("2031-06-16 10:00", "María")];
        let checker = AvailabilityChecker::new(&salon, &appointments, dt(NOW));

        assert!(!checker.check_availability("María", date("2031-06-16"), time("10:00")));
        assert!(checker.check_availability("Carlos", date("2031-06-16"), time("10:00")));
        assert!(checker.check_availability("María", date("2031-06-16"), time("10:30")));
        assert!(checker.check_availability("María", date("2031-06-17"), time("10:00")));
    }

    #[test]
    fn test_any_staff_conflicts_with_every_booking() {
        let salon = SalonConfig::default();
        let appointments = vec![booked("2031-06-16 10:00", "Carlos")];
        let checker = AvailabilityChecker::new(&salon, &appointments, dt(NOW));
        assert!(!checker.check_availability(ANY_STAFF, date("2031-06-16"), time("10:00")));
    }

    #[test]
    fn test_any_staff_booking_does_not_block_named_staff() {
        let salon = SalonConfig::default();
        let appointments = vec![booked("2031-06-16 10:00", ANY_STAFF)];
        let checker = AvailabilityChecker::new(&salon, &appointments, dt(NOW));
        assert!(checker.check_availability("María", date("2031-06-16"), time("10:00")));
        assert!(!checker.check_availability(ANY_STAFF, date("2031-06-16"), time("10:00")));
    }

    #[test]
    fn test_suggested_times_skip_booked_slots_in_order() {
        let salon = SalonConfig::default();
        let appointments = vec![
            booked("2031-06-16 09:00", "María"),
            booked("2031-06-16 09:30", "Carlos"),
            booked("2031-06-16 10:30", "María"),
        ];
        let checker = AvailabilityChecker::new(&salon, &appointments, dt(NOW));

        assert_eq!(
            checker.suggested_times("María", date("2031-06-16"), 3),
            vec!["09:30", "10:00", "11:00"]
        );
        assert_eq!(
            checker.suggested_times(ANY_STAFF, date("2031-06-16"), 3),
            vec!["10:00", "11:00", "11:30"]
        );
    }

    #[test]
    fn test_suggested_times_respect_limit_and_close() {
        let salon = SalonConfig::default();
        let checker = AvailabilityChecker::new(&salon, &[], dt(NOW));
        let all = checker.suggested_times("María", date("2031-06-16"), 100);
        assert_eq!(all.len(), 22);
        assert_eq!(all.first().map(String::as_str), Some("09:00"));
        assert_eq!(all.last().map(String::as_str), Some("19:30"));
        assert!(all.windows(2).all(|w| w[0] < w[1]));
        assert!(checker.suggested_times("María", date("2031-06-16"), 0).is_empty());
    }

    #[test]
    fn test_suggested_times_skip_past_slots_today() {
        let salon = SalonConfig::default();
        let checker = AvailabilityChecker::new(&salon, &[], dt("2031-06-16 18:10"));
        assert_eq!(
            checker.suggested_times("María", date("2031-06-16"), 3),
            vec!["18:30", "19:00", "19:30"]
        );
    }

    #[test]
    fn test_suggested_times_with_half_hour_opening() {
        let mut salon = SalonConfig::default();
        salon.open_time = time("09:30");
        salon.close_time = time("11:00");
        let checker = AvailabilityChecker::new(&salon, &[], dt(NOW));
        assert_eq!(
            checker.suggested_times("María", date("2031-06-16"), 5),
            vec!["09:30", "10:00", "10:30"]
        );
    }

    #[test]
    fn test_validate_slot_reports_first_failure() {
        let salon = SalonConfig::default();
        let checker = AvailabilityChecker::new(&salon, &[], dt(NOW));

        // Past and also a Sunday outside hours: past wins.
        assert_eq!(
            checker.validate_slot("María", date("2031-06-08"), time("22:00")),
            Err(SlotRejection::InPast)
        );
        // Sunday outside hours: closed day wins.
        assert!(matches!(
            checker.validate_slot("María", date("2031-06-15"), time("22:00")),
            Err(SlotRejection::ClosedDay { .. })
        ));
        assert!(matches!(
            checker.validate_slot("María", date("2031-06-16"), time("22:00")),
            Err(SlotRejection::OutsideHours { .. })
        ));
        assert!(checker
            .validate_slot("María", date("2031-06-16"), time("10:00"))
            .is_ok());
    }

    #[test]
    fn test_validate_slot_conflict_includes_suggestions() {
        let salon = SalonConfig::default();
        let appointments = vec![booked("2031-06-16 10:00", "María")];
        let checker = AvailabilityChecker::new(&salon, &appointments, dt(NOW));

        let err = checker
            .validate_slot(ANY_STAFF, date("2031-06-16"), time("10:00"))
            .unwrap_err();
        assert_eq!(
            err,
            SlotRejection::Taken {
                suggestions: vec!["09:00".into(), "09:30".into(), "10:30".into()]
            }
        );
        assert!(err.to_string().contains("09:00, 09:30, 10:30"));
    }

    #[test]
    fn test_rejection_messages() {
        assert!(SlotRejection::InPast.to_string().contains("ya han pasado"));
        let closed = SlotRejection::ClosedDay {
            days: "Lun, Mar".to_string(),
        };
        assert!(closed.to_string().contains("Lun, Mar"));
        let full = SlotRejection::Taken {
            suggestions: vec![],
        };
        assert!(full.to_string().contains("otra fecha"));
    }
}
