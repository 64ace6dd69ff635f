use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const DAY_FORMAT: &str = "%Y-%m-%d";

// Date-times without an explicit offset are taken as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%b %d %Y", "%d %b %Y"];

/// Normalizes an upstream date value to `YYYY-MM-DD`.
///
/// Values already shaped like `dddd-dd-dd` pass through untouched, even when they do not
/// name a real calendar day. Anything unparseable is returned as-is.
pub fn normalize_date(raw: &str) -> String {
    if raw.is_empty() || is_day_shaped(raw) {
        return raw.to_string();
    }

    match parse_generic_date(raw) {
        Some(date) => date.format(DAY_FORMAT).to_string(),
        None => raw.to_string(),
    }
}

/// Best-effort parse of the date formats seen from upstream feeds, reduced to a UTC
/// calendar day.
pub fn parse_generic_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    None
}

/// `^\d{4}-\d{2}-\d{2}$`
fn is_day_shaped(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b.iter().enumerate().all(|(i, c)| match i {
            4 | 7 => *c == b'-',
            _ => c.is_ascii_digit(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_shaped_values_are_identity() {
        for s in ["2024-01-15", "1999-12-31", "2024-02-30", "0000-00-00"] {
            assert_eq!(normalize_date(s), s);
        }
    }

    #[test]
    fn rfc3339_is_reduced_to_utc_day() {
        assert_eq!(normalize_date("2024-01-15T00:00:00Z"), "2024-01-15");
        assert_eq!(normalize_date("2024-01-15T23:30:00.123Z"), "2024-01-15");
        // 02:00 at +09:00 is the previous day in UTC.
        assert_eq!(normalize_date("2024-01-15T02:00:00+09:00"), "2024-01-14");
    }

    #[test]
    fn other_common_shapes_are_normalized() {
        assert_eq!(normalize_date("2024-01-15 10:11:12"), "2024-01-15");
        assert_eq!(normalize_date("2024/01/15"), "2024-01-15");
        assert_eq!(normalize_date("01/15/2024"), "2024-01-15");
        assert_eq!(normalize_date("Mon, 15 Jan 2024 10:00:00 +0000"), "2024-01-15");
    }

    #[test]
    fn unparseable_values_fall_back_to_raw() {
        assert_eq!(normalize_date("yesterday"), "yesterday");
        assert_eq!(normalize_date("2024-1-5x"), "2024-1-5x");
        assert_eq!(normalize_date(""), "");
    }

    #[test]
    fn generic_parse_rejects_impossible_days() {
        assert_eq!(parse_generic_date("2024-02-30"), None);
        assert_eq!(
            parse_generic_date("2024-02-29"),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn day_shape_check() {
        assert!(is_day_shaped("2024-01-15"));
        assert!(!is_day_shaped("2024-01-15T00:00:00Z"));
        assert!(!is_day_shaped("2024/01/15"));
        assert!(!is_day_shaped("24-01-15"));
    }
}
