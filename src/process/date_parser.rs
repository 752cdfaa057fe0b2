use chrono::{NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d, %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d;%H%M%S",
    "%Y-%m-%d;%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y"];

/// Parse the date/time spellings found in activity exports, e.g.
/// `"2025-11-27, 15:41:12"`, `"2025-12-06, 15:59:09 EST"`, `"2025-11-27"`, `"20251127"`.
/// Date-only values land on midnight.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let s = strip_zone(raw.trim().trim_matches('"'));
    if s.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    // compact YYYYMMDD
    if s.len() == 8 && s.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = s[0..4].parse().ok()?;
        let month: u32 = s[4..6].parse().ok()?;
        let day: u32 = s[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Drop a trailing alphabetic time zone token ("EST", "EDT", "UTC").
fn strip_zone(s: &str) -> &str {
    match s.rsplit_once(' ') {
        Some((head, zone))
            if !zone.is_empty()
                && zone.chars().all(|c| c.is_ascii_alphabetic())
                && head.chars().any(|c| c == ':') =>
        {
            head.trim_end()
        }
        _ => s,
    }
}
