//! Order timestamp parsing and calendar-window matching.
//!
//! Orders carry their timestamp as free text in one of two shapes: the
//! en-AU locale string written by the booking form
//! (`17/09/2025, 3:23:27 am`) or an ISO-8601 string written by the API
//! (`2025-09-16T21:31:36`). When neither parse succeeds the window checks
//! fall back to looking for the formatted reference date inside the raw
//! text.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::model::PLACEHOLDER;

/// Parse an order timestamp into local wall-clock time.
pub fn parse_order_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() || raw == PLACEHOLDER {
        return None;
    }

    if raw.contains('/') && raw.contains(',') {
        return parse_locale_timestamp(raw);
    }

    if raw.contains('T') && raw.contains('-') {
        return parse_iso_timestamp(raw);
    }

    debug!(timestamp = raw, "unknown order timestamp format");
    None
}

/// `DD/MM/YYYY, H:MM:SS am|pm`
fn parse_locale_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let (date_part, time_part) = raw.split_once(", ")?;

    let mut date_fields = date_part.split('/');
    let day = date_fields.next()?.trim();
    let month = date_fields.next()?.trim();
    let year = date_fields.next()?.trim();

    let mut time_fields = time_part.split(':');
    let mut hours = leading_int(time_fields.next()?)?;
    let minutes = time_fields.next()?;
    let seconds = time_fields.next()?.split(' ').next()?;

    let is_am = time_part.to_ascii_lowercase().contains("am");
    if !is_am && hours < 12 {
        hours += 12;
    }
    if is_am && hours == 12 {
        hours = 0;
    }

    let iso = format!("{year}-{month:0>2}-{day:0>2}T{hours:02}:{minutes}:{seconds}");
    let parsed = NaiveDateTime::parse_from_str(&iso, "%Y-%m-%dT%H:%M:%S").ok();
    if parsed.is_none() {
        debug!(timestamp = raw, assembled = %iso, "failed to parse order timestamp");
    }
    parsed
}

fn parse_iso_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.with_timezone(&Local).naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive);
        }
    }
    debug!(timestamp = raw, "failed to parse ISO order timestamp");
    None
}

/// Integer prefix of `s`, ignoring leading whitespace (`" 3"` → 3, `"3pm"` → 3).
fn leading_int(s: &str) -> Option<u32> {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse().ok()
}

fn has_timestamp(raw: &str) -> bool {
    let raw = raw.trim();
    !raw.is_empty() && raw != PLACEHOLDER
}

/// `DD/MM/YYYY`
pub fn format_day(date: NaiveDate) -> String {
    format!("{:02}/{:02}/{}", date.day(), date.month(), date.year())
}

/// `/MM/YYYY`
pub fn format_month(date: NaiveDate) -> String {
    format!("/{:02}/{}", date.month(), date.year())
}

/// Whether the order timestamp falls on the calendar day of `reference`.
pub fn falls_on_day(raw: &str, reference: NaiveDate) -> bool {
    if !has_timestamp(raw) {
        return false;
    }
    match parse_order_timestamp(raw) {
        Some(ts) => ts.date() == reference,
        None => raw.contains(&format_day(reference)),
    }
}

/// Whether the order timestamp falls in the month and year of `reference`.
pub fn falls_in_month(raw: &str, reference: NaiveDate) -> bool {
    if !has_timestamp(raw) {
        return false;
    }
    match parse_order_timestamp(raw) {
        Some(ts) => ts.month() == reference.month() && ts.year() == reference.year(),
        None => raw.contains(&format_month(reference)),
    }
}

/// Today's date in local time.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn locale_morning() {
        assert_eq!(
            parse_order_timestamp("17/09/2025, 3:23:27 am"),
            Some(at(2025, 9, 17, 3, 23, 27))
        );
    }

    #[test]
    fn locale_afternoon() {
        assert_eq!(
            parse_order_timestamp("17/09/2025, 3:23:27 pm"),
            Some(at(2025, 9, 17, 15, 23, 27))
        );
    }

    #[test]
    fn locale_noon_and_midnight() {
        assert_eq!(
            parse_order_timestamp("1/2/2025, 12:00:05 am"),
            Some(at(2025, 2, 1, 0, 0, 5))
        );
        assert_eq!(
            parse_order_timestamp("1/2/2025, 12:30:00 pm"),
            Some(at(2025, 2, 1, 12, 30, 0))
        );
    }

    #[test]
    fn iso_is_unchanged() {
        assert_eq!(
            parse_order_timestamp("2025-09-16T21:31:36"),
            Some(at(2025, 9, 16, 21, 31, 36))
        );
    }

    #[test]
    fn unknown_shapes_are_unparseable() {
        assert_eq!(parse_order_timestamp("—"), None);
        assert_eq!(parse_order_timestamp(""), None);
        assert_eq!(parse_order_timestamp("yesterday"), None);
        assert_eq!(parse_order_timestamp("17/09/2025"), None);
        assert_eq!(parse_order_timestamp("17/09/2025, 3:23 am"), None);
    }

    #[test]
    fn day_window_uses_parsed_date() {
        let day = NaiveDate::from_ymd_opt(2025, 9, 17).unwrap();
        assert!(falls_on_day("17/09/2025, 11:59:59 pm", day));
        assert!(!falls_on_day("2025-09-16T21:31:36", day));
        assert!(!falls_on_day("—", day));
    }

    #[test]
    fn day_window_falls_back_to_substring() {
        let day = NaiveDate::from_ymd_opt(2025, 9, 17).unwrap();
        // No comma, so not the locale shape; the formatted date still matches.
        assert!(falls_on_day("booked 17/09/2025 morning", day));
        assert!(!falls_on_day("booked 18/09/2025 morning", day));
    }

    #[test]
    fn malformed_locale_time_uses_substring_fallback() {
        let day = NaiveDate::from_ymd_opt(2025, 9, 17).unwrap();
        for raw in ["17/09/2025, 3:23:27am", "17/09/2025, 3:23:27\u{202f}am"] {
            assert_eq!(parse_order_timestamp(raw), None);
            assert!(falls_on_day(raw, day));
            assert!(falls_in_month(raw, day));
        }
        let other = NaiveDate::from_ymd_opt(2025, 9, 18).unwrap();
        assert!(!falls_on_day("17/09/2025, 3:23:27am", other));
    }

    #[test]
    fn month_window() {
        let day = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        assert!(falls_in_month("30/09/2025, 1:00:00 pm", day));
        assert!(falls_in_month("2025-09-16T21:31:36", day));
        assert!(!falls_in_month("2024-09-16T21:31:36", day));
        assert!(falls_in_month("week of 22/09/2025", day));
        assert!(!falls_in_month("week of 22/10/2025", day));
    }

    #[test]
    fn reference_formats() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        assert_eq!(format_day(day), "04/03/2025");
        assert_eq!(format_month(day), "/03/2025");
    }
}
