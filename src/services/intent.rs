use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

/// Leading-integer extraction: "2", " 2 por favor" and "2." all select 2.
pub fn extract_selection(text: &str) -> Option<usize> {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Finds a `D/M/YYYY H:MM` date and time anywhere in the text. Calendar-invalid
/// values such as 31/02 yield `None`.
pub fn extract_date_time(text: &str) -> Option<(NaiveDate, NaiveTime)> {
    static DATE_TIME_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = DATE_TIME_REGEX.get_or_init(|| {
        Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})\s+(\d{1,2}):(\d{2})")
            .expect("Invalid date/time regex")
    });

    let caps = re.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    let hour: u32 = caps[4].parse().ok()?;
    let minute: u32 = caps[5].parse().ok()?;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    Some((date, time))
}
