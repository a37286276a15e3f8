use std::sync::OnceLock;

use chrono::{Duration, Months, NaiveDate};
use regex::Regex;

use crate::models::RawDate;

/// Canonical output format for every derived date column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Largest serial magnitude accepted; anything beyond is far outside the calendar.
const MAX_SERIAL_DAYS: f64 = 100_000_000.0;

/// Which raw date encoding an ingestion path produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateEncoding {
    /// `MM/DD/YY` or `MM/DD/YYYY` strings (offline pipeline, background worker).
    SlashString,
    /// Spreadsheet serial day numbers (client-side CSV fallback).
    ExcelSerial,
}

fn slash_date_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2,4})$").ok())
        .as_ref()
}

/// Parses `M/D/YY`, `MM/DD/YY` or `MM/DD/YYYY`. A year below 100 means `2000 + yy`.
///
/// Out-of-range months and days roll over into the neighbouring month or
/// year (`2/30/24` is 2024-03-01, `0/0/24` is 2023-11-30). Returns `None`
/// only when the pattern does not match.
pub fn parse_slash_date(input: &str) -> Option<NaiveDate> {
    let caps = slash_date_regex()?.captures(input.trim())?;

    let month: u32 = caps[1].parse().ok()?;
    let day: i64 = caps[2].parse().ok()?;
    let mut year: i32 = caps[3].parse().ok()?;
    if year < 100 {
        year += 2000;
    }

    let january = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let month_start = match month.checked_sub(1) {
        Some(offset) => january.checked_add_months(Months::new(offset))?,
        None => january.checked_sub_months(Months::new(1))?,
    };
    month_start.checked_add_signed(Duration::try_days(day - 1)?)
}

/// Converts a spreadsheet serial day number: `1900-01-01 + (serial - 2)` days.
///
/// The two-day shift reproduces the spreadsheet convention (day 1 is
/// 1900-01-01 and the phantom 1900-02-29 is counted). Fractional serials
/// are truncated to the day they fall in.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial.abs() > MAX_SERIAL_DAYS {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1900, 1, 1)?;
    let offset = Duration::try_days(serial.floor() as i64 - 2)?;
    epoch.checked_add_signed(offset)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Formats a raw date cell, picking the strategy matching its encoding.
/// Unparseable input yields `None`, never an error.
pub fn normalize_raw_date(raw: &RawDate) -> Option<String> {
    let date = match raw {
        RawDate::Serial(serial) => excel_serial_to_date(*serial),
        RawDate::Text(text) => parse_slash_date(text),
    };
    date.map(format_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_two_digit_year_maps_to_2000s() {
        assert_eq!(parse_slash_date("1/15/24"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_slash_date("07/04/05"), Some(ymd(2005, 7, 4)));
    }

    #[test]
    fn test_four_digit_year_kept() {
        assert_eq!(parse_slash_date("12/31/1999"), Some(ymd(1999, 12, 31)));
    }

    #[test]
    fn test_non_matching_strings_are_none() {
        assert_eq!(parse_slash_date("2024-01-15"), None);
        assert_eq!(parse_slash_date(""), None);
        assert_eq!(parse_slash_date("1/15/2"), None);
        assert_eq!(parse_slash_date("123/1/24"), None);
    }

    #[test]
    fn test_out_of_range_parts_roll_over() {
        assert_eq!(parse_slash_date("2/30/24"), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_slash_date("2/29/23"), Some(ymd(2023, 3, 1)));
        // month 13 is January of the next year, then 39 more days
        assert_eq!(parse_slash_date("13/40/24"), Some(ymd(2025, 2, 9)));
        assert_eq!(parse_slash_date("0/0/24"), Some(ymd(2023, 11, 30)));
    }

    #[test]
    fn test_century_rule_uses_year_value() {
        assert_eq!(parse_slash_date("1/1/024"), Some(ymd(2024, 1, 1)));
        assert_eq!(parse_slash_date("1/1/0099"), Some(ymd(2099, 1, 1)));
        assert_eq!(parse_slash_date("1/1/100"), Some(ymd(100, 1, 1)));
    }

    #[test]
    fn test_excel_serial_follows_offset_rule() {
        let expected = ymd(1900, 1, 1) + Duration::days(44927 - 2);
        assert_eq!(excel_serial_to_date(44927.0), Some(expected));
        assert_eq!(excel_serial_to_date(44927.0), Some(ymd(2023, 1, 1)));
        assert_eq!(excel_serial_to_date(44927.75), Some(expected));
        assert_eq!(excel_serial_to_date(2.0), Some(ymd(1900, 1, 1)));
    }

    #[test]
    fn test_excel_serial_rejects_non_finite() {
        assert_eq!(excel_serial_to_date(f64::NAN), None);
        assert_eq!(excel_serial_to_date(f64::INFINITY), None);
    }

    #[test]
    fn test_normalize_dispatches_on_encoding() {
        assert_eq!(
            normalize_raw_date(&RawDate::Text("1/15/24".into())).as_deref(),
            Some("2024-01-15")
        );
        assert_eq!(
            normalize_raw_date(&RawDate::Serial(44927.0)).as_deref(),
            Some("2023-01-01")
        );
        assert_eq!(normalize_raw_date(&RawDate::Text("n/a".into())), None);
    }

    #[test]
    fn test_normalization_is_pure() {
        let raw = RawDate::Text("3/9/22".into());
        assert_eq!(normalize_raw_date(&raw), normalize_raw_date(&raw));
    }
}
