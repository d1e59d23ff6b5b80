//! Timestamp value type.

use chrono::{DateTime, FixedOffset, Local, SecondsFormat, TimeZone};
use std::fmt;

/// Milliseconds per quarter of an hour.
const QUARTER_HOUR_MS: i64 = 15 * 60 * 1000;

/// A point in time: milliseconds since the Unix epoch plus the local UTC
/// offset, kept at quarter-hour granularity.
///
/// The coarse offset keeps the bit encoding small (7 signed bits cover
/// every real-world zone, UTC-12:00 through UTC+14:00) while preserving
/// the local wall-clock time the value was captured at, which matters for
/// field data collected across time zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeStamp {
    ms_since_epoch: i64,
    quarter_hour_offset: i8,
}

impl TimeStamp {
    /// Creates a timestamp from raw parts.
    #[must_use]
    pub fn new(ms_since_epoch: i64, quarter_hour_offset: i8) -> Self {
        Self {
            ms_since_epoch,
            quarter_hour_offset,
        }
    }

    /// The current time in the local zone.
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(&Local::now().fixed_offset())
    }

    /// Converts from a chrono datetime, truncating the zone offset to
    /// quarter-hour granularity.
    #[must_use]
    pub fn from_datetime(value: &DateTime<FixedOffset>) -> Self {
        Self {
            ms_since_epoch: value.timestamp_millis(),
            quarter_hour_offset: (i64::from(value.offset().local_minus_utc()) * 1000
                / QUARTER_HOUR_MS) as i8,
        }
    }

    /// Converts to a chrono datetime in the stored offset.
    ///
    /// Returns `None` when the millisecond count lies outside chrono's
    /// representable range.
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(
            (i64::from(self.quarter_hour_offset) * QUARTER_HOUR_MS / 1000) as i32,
        )?;
        offset.timestamp_millis_opt(self.ms_since_epoch).single()
    }

    /// Milliseconds since the Unix epoch (UTC).
    #[must_use]
    pub fn ms_since_epoch(&self) -> i64 {
        self.ms_since_epoch
    }

    /// UTC offset in quarters of an hour.
    #[must_use]
    pub fn quarter_hour_offset(&self) -> i8 {
        self.quarter_hour_offset
    }

    /// RFC 3339 text form with millisecond precision, used for SQL storage.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        match self.to_datetime() {
            Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            // Out-of-range values cannot occur for timestamps we created,
            // but fall back to the raw form rather than panic.
            None => format!("@{}q{}", self.ms_since_epoch, self.quarter_hour_offset),
        }
    }

    /// Parses the RFC 3339 text form produced by [`TimeStamp::to_rfc3339`].
    pub fn parse_rfc3339(text: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(text).map(|dt| Self::from_datetime(&dt))
    }
}

impl fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}
