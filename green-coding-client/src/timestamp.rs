//! Lenient timestamp parsing shared by the API decoders and the plugin.
//!
//! Accepted shapes:
//! - RFC 3339 (`2024-07-24T09:43:38.428708+00:00`)
//! - date-time with a zone but optional seconds (`2024-07-24T10:00Z`,
//!   `2024-07-24T10:00+02:00`)
//! - naive date-time, read as UTC (`2024-07-24T10:00`, `2024-07-24 10:00:05.5`)
//! - date only, read as midnight UTC (`2024-07-24`)

use time::format_description::well_known::Rfc3339;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

const NAIVE_DATE_TIME: &[BorrowedFormatItem<'_>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute][optional [:[second][optional [.[subsecond]]]]]"
);

const ZONED_DATE_TIME: &[BorrowedFormatItem<'_>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute][optional [:[second][optional [.[subsecond]]]]][offset_hour sign:mandatory]:[offset_minute]"
);

const DATE_ONLY: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// Parse a timestamp string into an absolute UTC-anchored instant.
pub fn parse(raw: &str) -> Option<OffsetDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Postgres-style output uses a space between date and time.
    let normalized = match trimmed.as_bytes().get(10) {
        Some(b' ') => format!("{}T{}", &trimmed[..10], &trimmed[11..]),
        _ => trimmed.to_string(),
    };

    if let Ok(ts) = OffsetDateTime::parse(&normalized, &Rfc3339) {
        return Some(ts);
    }

    if let Ok(ts) = PrimitiveDateTime::parse(&normalized, NAIVE_DATE_TIME) {
        return Some(ts.assume_utc());
    }

    let zoned = match normalized.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{rest}+00:00"),
        None => normalized.clone(),
    };
    if let Ok(ts) = OffsetDateTime::parse(&zoned, ZONED_DATE_TIME) {
        return Some(ts);
    }

    Date::parse(&normalized, DATE_ONLY)
        .ok()
        .map(|d| d.midnight().assume_utc())
}

/// Format the calendar date part as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    date.format(DATE_ONLY)
        .unwrap_or_else(|_| format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day()))
}
