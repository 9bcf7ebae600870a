//! Timestamp codecs for the wire payload.

use chrono::{DateTime, FixedOffset, Utc};

use crate::error::MetalsError;

/// `timeToUpdate` format, always rendered in UTC (`+0000`).
pub const TIME_TO_UPDATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%z";

/// `currentDate` display format.
pub const DISPLAY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn format_time_to_update(t: DateTime<Utc>) -> String {
    t.format(TIME_TO_UPDATE_FORMAT).to_string()
}

/// Parses a `timeToUpdate` value. RFC 3339 is accepted as well.
pub fn parse_time_to_update(s: &str) -> Result<DateTime<Utc>, MetalsError> {
    DateTime::parse_from_str(s.trim(), TIME_TO_UPDATE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(s.trim()))
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| MetalsError::InvalidTimestamp {
            value: s.to_string(),
            source,
        })
}

/// Site-local wall clock used for `currentDate`.
pub fn format_display_date(t: DateTime<Utc>, offset: FixedOffset) -> String {
    t.with_timezone(&offset).format(DISPLAY_DATE_FORMAT).to_string()
}
