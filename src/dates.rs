// src/dates.rs
//! Date utilities: parsing heterogeneous source timestamps into calendar dates,
//! judging how trustworthy a date is, and turning dates into recency scores.
//!
//! Every "now"-dependent function has an `*_at` twin taking an explicit `today`
//! so tests do not depend on the wall clock.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::DateConfidence;

/// Default recency window for general research.
pub const DEFAULT_MAX_DAYS: u32 = 365;
/// Recency window for time-sensitive (news) queries.
pub const NEWS_MAX_DAYS: u32 = 30;

const DATE_FMT: &str = "%Y-%m-%d";

/// Current UTC calendar date.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// `(from, to)` as `YYYY-MM-DD` strings for the last `days` days.
pub fn date_range(days: i64) -> (String, String) {
    date_range_at(days, today_utc())
}

pub fn date_range_at(days: i64, today: NaiveDate) -> (String, String) {
    let from = today - Duration::days(days);
    (from.format(DATE_FMT).to_string(), today.format(DATE_FMT).to_string())
}

/// Parse a timestamp in any of the formats the sources emit:
/// unix seconds, `YYYY-MM-DD`, ISO 8601 with or without zone / fraction.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    // Unix timestamps (HN, Stack Exchange)
    if let Ok(ts) = s.parse::<f64>() {
        if !ts.is_finite() {
            return None;
        }
        let secs = ts.trunc() as i64;
        let nanos = ((ts.fract().abs()) * 1e9) as u32;
        return Utc.timestamp_opt(secs, nanos).single();
    }

    if let Ok(d) = NaiveDate::parse_from_str(s, DATE_FMT) {
        return d.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
    }

    // Z, +00:00 and fractional seconds
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // +0000 style offsets
    for fmt in ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    // Naive datetimes are taken as UTC
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }

    None
}

/// Parse anything `parse_date` understands and keep only the calendar date.
pub fn to_date_string(raw: &str) -> Option<String> {
    parse_date(raw).map(|dt| dt.date_naive().format(DATE_FMT).to_string())
}

/// Unix seconds → `YYYY-MM-DD`.
pub fn timestamp_to_date(ts: i64) -> Option<String> {
    Utc.timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.date_naive().format(DATE_FMT).to_string())
}

static URL_DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"/(\d{4})/(\d{2})/(\d{2})/", // /2024/01/15/
        r"/(\d{4})-(\d{2})-(\d{2})",  // /2024-01-15
        r"(\d{4})(\d{2})(\d{2})",     // 20240115
    ]
    .iter()
    .map(|p| Regex::new(p).expect("url date regex"))
    .collect()
});

/// Try to read a publication date out of a URL path.
pub fn extract_date_from_url(url: &str) -> Option<String> {
    extract_date_from_url_at(url, today_utc())
}

pub fn extract_date_from_url_at(url: &str, today: NaiveDate) -> Option<String> {
    for re in URL_DATE_PATTERNS.iter() {
        let Some(caps) = re.captures(url) else {
            continue;
        };
        let year = caps[1].parse::<i32>().ok();
        let month = caps[2].parse::<u32>().ok();
        let day = caps[3].parse::<u32>().ok();
        let date = match (year, month, day) {
            (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y, m, d),
            _ => None,
        };
        if let Some(d) = date {
            // reject version numbers, ids and the like
            if (2010..=today.year() + 1).contains(&d.year()) {
                return Some(d.format(DATE_FMT).to_string());
            }
        }
    }
    None
}

/// Confidence in `date` given an optional URL and an optional expected range.
pub fn date_confidence(
    date: Option<&str>,
    url: Option<&str>,
    range: Option<(NaiveDate, NaiveDate)>,
) -> DateConfidence {
    date_confidence_at(date, url, range, today_utc())
}

pub fn date_confidence_at(
    date: Option<&str>,
    url: Option<&str>,
    range: Option<(NaiveDate, NaiveDate)>,
    today: NaiveDate,
) -> DateConfidence {
    let date = date.map(str::trim).filter(|d| !d.is_empty());

    let Some(date) = date else {
        // a date in the URL is better than nothing
        return match url.and_then(|u| extract_date_from_url_at(u, today)) {
            Some(_) => DateConfidence::Med,
            None => DateConfidence::Low,
        };
    };

    let Ok(d) = NaiveDate::parse_from_str(date, DATE_FMT) else {
        return DateConfidence::Low;
    };

    if d > today {
        return DateConfidence::Low;
    }

    if let Some((start, end)) = range {
        return if start <= d && d <= end {
            DateConfidence::High
        } else {
            DateConfidence::Med
        };
    }

    if let Some(u) = url {
        if extract_date_from_url_at(u, today).as_deref() == Some(date) {
            return DateConfidence::High;
        }
    }

    DateConfidence::Med
}

/// Days between `date` (`YYYY-MM-DD`) and today; negative for future dates.
pub fn days_ago(date: Option<&str>) -> Option<i64> {
    days_ago_at(date, today_utc())
}

pub fn days_ago_at(date: Option<&str>, today: NaiveDate) -> Option<i64> {
    let d = NaiveDate::parse_from_str(date?.trim(), DATE_FMT).ok()?;
    Some((today - d).num_days())
}

/// Freshness in 0–100: today is 100, `max_days` or older is 0, linear in
/// between. Unknown dates score 0; future dates count as today.
pub fn recency_score(date: Option<&str>, max_days: u32) -> u32 {
    recency_score_at(date, max_days, today_utc())
}

pub fn recency_score_at(date: Option<&str>, max_days: u32, today: NaiveDate) -> u32 {
    let Some(age) = days_ago_at(date, today) else {
        return 0;
    };
    if age < 0 {
        return 100;
    }
    if age >= i64::from(max_days) {
        return 0;
    }
    (100.0 * (1.0 - age as f64 / f64::from(max_days))) as u32
}

/// Human-readable age such as "3 days ago" or "2 months ago".
pub fn format_relative_date(date: Option<&str>) -> String {
    format_relative_date_at(date, today_utc())
}

pub fn format_relative_date_at(date: Option<&str>, today: NaiveDate) -> String {
    let Some(age) = days_ago_at(date, today) else {
        return "unknown date".to_string();
    };
    fn plural(n: i64, unit: &str) -> String {
        format!("{n} {unit}{} ago", if n > 1 { "s" } else { "" })
    }
    match age {
        a if a <= 0 => "today".to_string(),
        1 => "yesterday".to_string(),
        a if a < 7 => format!("{a} days ago"),
        a if a < 30 => plural(a / 7, "week"),
        a if a < 365 => plural(a / 30, "month"),
        a => plural(a / 365, "year"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_range_spans_back_from_today() {
        let today = day(2024, 3, 1);
        assert_eq!(
            date_range_at(30, today),
            ("2024-01-31".to_string(), "2024-03-01".to_string())
        );
        assert_eq!(
            date_range_at(0, today),
            ("2024-03-01".to_string(), "2024-03-01".to_string())
        );
    }

    #[test]
    fn parses_common_formats() {
        let expect = "2024-01-15";
        for raw in [
            "2024-01-15",
            "2024-01-15T10:20:30",
            "2024-01-15T10:20:30Z",
            "2024-01-15T10:20:30+00:00",
            "2024-01-15T10:20:30.123Z",
            "2024-01-15T10:20:30+0000",
            "1705314030",
        ] {
            assert_eq!(to_date_string(raw).as_deref(), Some(expect), "{raw}");
        }
        assert!(parse_date("").is_none());
        assert!(parse_date("yesterday-ish").is_none());
    }

    #[test]
    fn timestamp_conversion() {
        assert_eq!(timestamp_to_date(0).as_deref(), Some("1970-01-01"));
        assert_eq!(timestamp_to_date(1_705_314_030).as_deref(), Some("2024-01-15"));
    }

    #[test]
    fn url_dates_are_extracted_and_sanity_checked() {
        let today = day(2025, 6, 1);
        assert_eq!(
            extract_date_from_url_at("https://blog.x/2024/01/15/post", today).as_deref(),
            Some("2024-01-15")
        );
        assert_eq!(
            extract_date_from_url_at("https://blog.x/posts/2024-03-02-title", today).as_deref(),
            Some("2024-03-02")
        );
        assert_eq!(
            extract_date_from_url_at("https://blog.x/p/20230704", today).as_deref(),
            Some("2023-07-04")
        );
        // too old / too far in the future
        assert!(extract_date_from_url_at("https://x/1999/01/01/", today).is_none());
        assert!(extract_date_from_url_at("https://x/2031/01/01/", today).is_none());
        assert!(extract_date_from_url_at("https://x/about", today).is_none());
    }

    #[test]
    fn confidence_levels() {
        let today = day(2025, 6, 1);
        assert_eq!(date_confidence_at(None, None, None, today), DateConfidence::Low);
        assert_eq!(
            date_confidence_at(None, Some("https://x/2025/05/01/a"), None, today),
            DateConfidence::Med
        );
        assert_eq!(
            date_confidence_at(Some("2025-07-01"), None, None, today),
            DateConfidence::Low
        );
        assert_eq!(
            date_confidence_at(Some("not-a-date"), None, None, today),
            DateConfidence::Low
        );
        assert_eq!(
            date_confidence_at(Some("2025-05-01"), None, None, today),
            DateConfidence::Med
        );
        assert_eq!(
            date_confidence_at(Some("2025-05-01"), Some("https://x/2025/05/01/a"), None, today),
            DateConfidence::High
        );
        let range = Some((day(2025, 5, 1), day(2025, 6, 1)));
        assert_eq!(
            date_confidence_at(Some("2025-05-10"), None, range, today),
            DateConfidence::High
        );
        assert_eq!(
            date_confidence_at(Some("2024-05-10"), None, range, today),
            DateConfidence::Med
        );
    }

    #[test]
    fn recency_edges() {
        let today = day(2025, 6, 1);
        assert_eq!(recency_score_at(None, 365, today), 0);
        assert_eq!(recency_score_at(Some("garbage"), 365, today), 0);
        assert_eq!(recency_score_at(Some("2025-06-01"), 365, today), 100);
        assert_eq!(recency_score_at(Some("2030-01-01"), 365, today), 100);
        assert_eq!(recency_score_at(Some("2024-06-01"), 365, today), 0);
        assert_eq!(recency_score_at(Some("2000-01-01"), 30, today), 0);
        // 7 days of 365: trunc(100 * (1 - 7/365)) = 98
        assert_eq!(recency_score_at(Some("2025-05-25"), 365, today), 98);
        // 15 of 30 → 50
        assert_eq!(recency_score_at(Some("2025-05-17"), 30, today), 50);
    }

    #[test]
    fn relative_formatting() {
        let today = day(2025, 6, 1);
        let f = |d: &str| format_relative_date_at(Some(d), today);
        assert_eq!(format_relative_date_at(None, today), "unknown date");
        assert_eq!(f("2025-06-01"), "today");
        assert_eq!(f("2025-05-31"), "yesterday");
        assert_eq!(f("2025-05-28"), "4 days ago");
        assert_eq!(f("2025-05-25"), "1 week ago");
        assert_eq!(f("2025-05-11"), "3 weeks ago");
        assert_eq!(f("2025-03-01"), "3 months ago");
        assert_eq!(f("2023-05-01"), "2 years ago");
    }
}
