//! Field-coercion helpers shared by the cleaning stages.
//!
//! Every parser here is total: failure is `None`, never an error. "Could
//! not parse" is a representable state the stages act on per their own
//! rules (undefined-value substitution or row exclusion), so nothing in
//! this module reaches for control flow.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a date cell. Accepts a plain ISO date, an RFC 3339 timestamp, or a
/// bare `YYYY-MM-DDTHH:MM:SS` (the date part is taken for the latter two).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(datetime.date_naive());
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(datetime.date());
    }
    None
}

/// Parse a timestamp cell into UTC. RFC 3339 offsets are honored; bare
/// datetimes and plain dates are assumed UTC.
pub fn parse_datetime_utc(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(datetime.with_timezone(&Utc));
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(datetime.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    None
}

/// Parse a numeric cell, returning `None` for empty or non-numeric input.
pub fn parse_f64(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Lower-case and trim a unit string; empty becomes undefined. Units are
/// standardized for consistency, not validated against a vocabulary.
pub fn normalize_unit(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_lowercase())
}

/// Normalize a medication code by numeric round-trip: parse as a number,
/// drop the fractional part, re-stringify. `"313782.0"` becomes
/// `"313782"`; codes that do not parse to a finite number are
/// irrecoverable and yield `None`.
pub fn normalize_medication_code(raw: &str) -> Option<String> {
    let value = parse_f64(raw)?;
    if !value.is_finite() {
        return None;
    }
    let truncated = value.trunc();
    // Codes large enough to lose integer precision are garbage input.
    if truncated < i64::MIN as f64 || truncated > i64::MAX as f64 {
        return None;
    }
    Some((truncated as i64).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_parse_from_common_shapes() {
        assert_eq!(parse_date("1990-01-01"), NaiveDate::from_ymd_opt(1990, 1, 1));
        assert_eq!(
            parse_date("2014-07-01T21:00:00Z"),
            NaiveDate::from_ymd_opt(2014, 7, 1)
        );
        assert_eq!(
            parse_date(" 2014-07-01T21:00:00 "),
            NaiveDate::from_ymd_opt(2014, 7, 1)
        );
        assert_eq!(parse_date("not-a-date"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("1990-13-40"), None);
    }

    #[test]
    fn timestamps_normalize_to_utc() {
        let parsed = parse_datetime_utc("2014-07-01T21:00:00-04:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2014-07-02T01:00:00+00:00");
        let bare = parse_datetime_utc("2014-07-01T21:00:00").unwrap();
        assert_eq!(bare.to_rfc3339(), "2014-07-01T21:00:00+00:00");
        let date_only = parse_datetime_utc("2014-07-01").unwrap();
        assert_eq!(date_only.to_rfc3339(), "2014-07-01T00:00:00+00:00");
        assert_eq!(parse_datetime_utc("soon"), None);
    }

    #[test]
    fn numeric_parse_is_none_on_failure() {
        assert_eq!(parse_f64("120.5"), Some(120.5));
        assert_eq!(parse_f64(" 98 "), Some(98.0));
        assert_eq!(parse_f64("Never smoker"), None);
        assert_eq!(parse_f64(""), None);
    }

    #[test]
    fn units_lowercase_and_trim() {
        assert_eq!(normalize_unit(Some(" mmHg ")), Some("mmhg".to_string()));
        assert_eq!(normalize_unit(Some("kg/m2")), Some("kg/m2".to_string()));
        assert_eq!(normalize_unit(Some("   ")), None);
        assert_eq!(normalize_unit(None), None);
    }

    #[test]
    fn medication_codes_round_trip_to_integers() {
        assert_eq!(
            normalize_medication_code("313782.0"),
            Some("313782".to_string())
        );
        assert_eq!(normalize_medication_code("313782"), Some("313782".to_string()));
        assert_eq!(normalize_medication_code("897.9"), Some("897".to_string()));
        assert_eq!(normalize_medication_code("unknown"), None);
        assert_eq!(normalize_medication_code("NaN"), None);
        assert_eq!(normalize_medication_code(""), None);
    }
}
