use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Storage format for creation/update timestamps (naive local time)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Storage format for calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Storage format for schedule times
pub const TIME_FORMAT: &str = "%H:%M";

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

impl Profile {
    fn app_name(self) -> &'static str {
        match self {
            Profile::Dev => "daybook-dev",
            Profile::Prod => "daybook",
        }
    }
}

/// Get the configuration directory path for daybook
/// If profile is Dev, uses "daybook-dev" instead of "daybook"
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "daybook", profile.app_name())
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path for daybook
/// If profile is Dev, uses "daybook-dev" instead of "daybook"
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "daybook", profile.app_name())
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Parse a date string in ISO 8601 format (YYYY-MM-DD)
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT)
}

/// Parse a wall-clock time (HH:MM)
pub fn parse_time(time_str: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(time_str.trim(), TIME_FORMAT)
}

/// Parse a stored timestamp. Accepts a bare date as midnight so rows written
/// by hand still decode.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).or_else(|err| {
        parse_date(value)
            .map(|date| date.and_time(NaiveTime::MIN))
            .map_err(|_| err)
    })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Current local time truncated to whole seconds
pub fn now_local() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Current local calendar date
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Month bucket key (`YYYY-MM`) for a date
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Validate a `YYYY-MM` month key, returning it normalised
pub fn parse_month(value: &str) -> Option<String> {
    let value = value.trim();
    let (year, month) = value.split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1).map(month_key)
}

/// Parse a user-entered money amount. Thousands separators (`,` and `_`)
/// are ignored; the decimal separator is `.`.
pub fn parse_amount(value: &str) -> Option<f64> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_key_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(month_key(date), "2024-03");
    }

    #[test]
    fn parse_month_rejects_garbage() {
        assert_eq!(parse_month("2024-1"), None);
        assert_eq!(parse_month("2024-13"), None);
        assert_eq!(parse_month("march"), None);
        assert_eq!(parse_month(" 2024-12 ").as_deref(), Some("2024-12"));
    }

    #[test]
    fn parse_amount_ignores_thousands_separators() {
        assert_eq!(parse_amount("300,000"), Some(300000.0));
        assert_eq!(parse_amount("12.5"), Some(12.5));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("NaN"), None);
    }

    #[test]
    fn parse_timestamp_accepts_bare_dates() {
        let ts = parse_timestamp("2024-01-01").unwrap();
        assert_eq!(format_timestamp(ts), "2024-01-01 00:00:00");
        assert!(parse_timestamp("01/01/2024").is_err());
    }
}
