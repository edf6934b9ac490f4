//! Date keying for the habit tracker.
//!
//! Every record in the tracker is keyed by a calendar-day string
//! (`YYYY-MM-DD`) or a calendar-month string (`YYYY-MM`) in local time.
//! Keys are compared by exact string equality everywhere, so all key
//! construction goes through this module.

use anyhow::Result;
use chrono::{DateTime, Local, Months, NaiveDate, Timelike};

/// Hour of day below which a logged sleep time counts toward the previous
/// calendar day (a 01:30 bedtime belongs to the night before). Used only
/// by [`sleep_day_key`]; storage itself never shifts dates.
pub const DEFAULT_SLEEP_CUTOFF_HOUR: u32 = 5;

/// Format a date as a canonical day key, e.g. `2024-03-07`.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a date as a canonical month key, e.g. `2024-03`.
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Day key for the current local calendar day.
pub fn today_key() -> String {
    day_key(Local::now().date_naive())
}

/// Month key for the current local calendar month.
pub fn current_month_key() -> String {
    month_key(Local::now().date_naive())
}

/// Parse a day key back into a date.
pub fn parse_day_key(key: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("Invalid day key '{}': {}", key, e))
}

/// Resolve the month key a day key belongs to.
///
/// The month partition invariant relies on this: an entry for day `d` may
/// only live under the month record whose key equals `month_key_for_day(d)`.
pub fn month_key_for_day(day_key: &str) -> Result<String> {
    let date = parse_day_key(day_key)?;
    Ok(month_key(date))
}

/// Shift a date by whole calendar months (not 30-day blocks), clamping the
/// day of month where the target month is shorter. Out-of-range shifts
/// leave the date unchanged.
pub fn shift_months(date: NaiveDate, delta: i32) -> NaiveDate {
    let shifted = if delta >= 0 {
        date.checked_add_months(Months::new(delta as u32))
    } else {
        date.checked_sub_months(Months::new((-delta) as u32))
    };
    shifted.unwrap_or(date)
}

/// Day key a sleep log entered "now" should display under: times before
/// `cutoff_hour` belong to the previous calendar day.
pub fn sleep_day_key(now: DateTime<Local>, cutoff_hour: u32) -> String {
    let date = now.date_naive();
    if now.hour() < cutoff_hour {
        day_key(date.pred_opt().unwrap_or(date))
    } else {
        day_key(date)
    }
}

/// Parse an `HH:mm` string into a fractional hour-of-day (`23:30` → 23.5).
/// Returns `None` for anything that does not split into two numbers.
pub fn parse_time_to_hours(time: &str) -> Option<f64> {
    let mut parts = time.split(':');
    let hours: u32 = parts.next()?.parse().ok()?;
    let minutes: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(hours as f64 + minutes as f64 / 60.0)
}

/// Format a fractional hour-of-day back into `HH:mm`, rounding to the
/// nearest minute and wrapping at 24 hours.
pub fn format_hours_to_time(hours: f64) -> String {
    let mut whole = hours.floor() as i64;
    let mut minutes = ((hours - hours.floor()) * 60.0).round() as i64;
    if minutes == 60 {
        whole += 1;
        minutes = 0;
    }
    whole = whole.rem_euclid(24);
    format!("{:02}:{:02}", whole, minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_and_month_keys() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(day_key(date), "2024-03-07");
        assert_eq!(month_key(date), "2024-03");
    }

    #[test]
    fn test_month_key_for_day_across_year_boundary() {
        assert_eq!(month_key_for_day("2024-12-31").unwrap(), "2024-12");
        assert_eq!(month_key_for_day("2025-01-01").unwrap(), "2025-01");
        assert_ne!(
            month_key_for_day("2024-12-31").unwrap(),
            month_key_for_day("2025-01-01").unwrap()
        );
    }

    #[test]
    fn test_parse_day_key_rejects_garbage() {
        assert!(parse_day_key("not-a-date").is_err());
        assert!(parse_day_key("2024-13-01").is_err());
        assert!(parse_day_key("2024-02-30").is_err());
    }

    #[test]
    fn test_shift_months_by_calendar_month() {
        let jan_31 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        // February is shorter, so the day clamps instead of spilling over
        assert_eq!(
            shift_months(jan_31, 1),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );

        let jan_1 = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(
            shift_months(jan_1, -1),
            NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()
        );
    }

    #[test]
    fn test_sleep_day_key_cutoff() {
        let late_night = Local.with_ymd_and_hms(2024, 3, 8, 1, 30, 0).unwrap();
        assert_eq!(sleep_day_key(late_night, DEFAULT_SLEEP_CUTOFF_HOUR), "2024-03-07");

        let evening = Local.with_ymd_and_hms(2024, 3, 8, 22, 15, 0).unwrap();
        assert_eq!(sleep_day_key(evening, DEFAULT_SLEEP_CUTOFF_HOUR), "2024-03-08");

        // Exactly at the cutoff stays on the same day
        let at_cutoff = Local.with_ymd_and_hms(2024, 3, 8, 5, 0, 0).unwrap();
        assert_eq!(sleep_day_key(at_cutoff, DEFAULT_SLEEP_CUTOFF_HOUR), "2024-03-08");
    }

    #[test]
    fn test_parse_time_to_hours() {
        assert_eq!(parse_time_to_hours("23:30"), Some(23.5));
        assert_eq!(parse_time_to_hours("00:00"), Some(0.0));
        assert_eq!(parse_time_to_hours("7:45"), Some(7.75));
        assert_eq!(parse_time_to_hours("bedtime"), None);
        assert_eq!(parse_time_to_hours("23"), None);
        assert_eq!(parse_time_to_hours("23:30:00"), None);
    }

    #[test]
    fn test_format_hours_to_time() {
        assert_eq!(format_hours_to_time(23.5), "23:30");
        assert_eq!(format_hours_to_time(0.0), "00:00");
        assert_eq!(format_hours_to_time(7.75), "07:45");
        // Rounding that would produce :60 carries into the hour
        assert_eq!(format_hours_to_time(22.9999), "23:00");
    }

    #[test]
    fn test_hours_round_trip() {
        for time in ["00:00", "04:59", "12:30", "23:59"] {
            let hours = parse_time_to_hours(time).unwrap();
            assert_eq!(format_hours_to_time(hours), time);
        }
    }
}
