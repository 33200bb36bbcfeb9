use crate::errors::{FetchError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Canonical second-precision UTC form used in queries and comparisons.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const EARLIEST: &str = "1970-01-01T00:00:00Z";
const LATEST: &str = "9999-12-31T23:59:59Z";

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

// Slashed dates are read day first.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

/// Closed modification-date interval, `first < last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    first: DateTime<Utc>,
    last: DateTime<Utc>,
}

impl TimeRange {
    /// Validates optional user bounds and fills in the defaults.
    ///
    /// A missing `first` is the Unix epoch and a missing `last` is the far
    /// future sentinel, so open ended queries stay stable between calls.
    pub fn resolve(first: Option<&str>, last: Option<&str>) -> Result<Self> {
        let first = parse_datetime(first.unwrap_or(EARLIEST))?;
        let last = parse_datetime(last.unwrap_or(LATEST))?;
        if first >= last {
            return Err(FetchError::InvalidTimeRange(format!(
                "first_modified {} must be before last_modified {}",
                format_canonical(&first),
                format_canonical(&last)
            )));
        }
        Ok(Self { first, last })
    }

    /// The widest interval, used when no date filter applies.
    pub fn unbounded() -> Self {
        Self {
            first: Utc.timestamp_opt(0, 0).single().unwrap_or_default(),
            last: sentinel_latest(),
        }
    }

    pub fn first_iso(&self) -> String {
        format_canonical(&self.first)
    }

    pub fn last_iso(&self) -> String {
        format_canonical(&self.last)
    }

    /// Inclusive containment on canonical strings.
    pub fn contains(&self, stamp: &str) -> bool {
        stamp >= self.first_iso().as_str() && stamp <= self.last_iso().as_str()
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

fn sentinel_latest() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

pub fn format_canonical(dt: &DateTime<Utc>) -> String {
    dt.format(CANONICAL_FORMAT).to_string()
}

/// Parses the loosely formatted date strings accepted on the query string.
pub fn parse_datetime(raw: &str) -> Result<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(truncate(dt.with_timezone(&Utc)));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(truncate(Utc.from_utc_datetime(&naive)));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Ok(Utc.from_utc_datetime(&naive));
            }
        }
    }
    Err(FetchError::InvalidTimeRange(format!(
        "could not parse date-time {:?}",
        raw
    )))
}

fn truncate(dt: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_opt(dt.timestamp(), 0).single().unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_everything() {
        let r = TimeRange::resolve(None, None).unwrap();
        assert_eq!(r.first_iso(), "1970-01-01T00:00:00Z");
        assert_eq!(r.last_iso(), "9999-12-31T23:59:59Z");
        assert_eq!(r, TimeRange::unbounded());
    }

    #[test]
    fn normalizes_loose_inputs() {
        let r = TimeRange::resolve(Some("2014-1-1T00:00:00Z"), Some("2015-01-01")).unwrap();
        assert_eq!(r.first_iso(), "2014-01-01T00:00:00Z");
        assert_eq!(r.last_iso(), "2015-01-01T00:00:00Z");

        let r = TimeRange::resolve(Some("01/02/2014"), Some("2014-03-13T12:13:14.250Z")).unwrap();
        assert_eq!(r.first_iso(), "2014-02-01T00:00:00Z");
        assert_eq!(r.last_iso(), "2014-03-13T12:13:14Z");
    }

    #[test]
    fn offsets_convert_to_utc() {
        let r = TimeRange::resolve(Some("2014-01-01T02:00:00+02:00"), None).unwrap();
        assert_eq!(r.first_iso(), "2014-01-01T00:00:00Z");
    }

    #[test]
    fn valid_bounds_round_trip() {
        let r = TimeRange::resolve(Some("2013-03-13T12:13:14Z"), Some("2014-03-13T12:13:14Z"))
            .unwrap();
        assert_eq!(r.first_iso(), "2013-03-13T12:13:14Z");
        assert_eq!(r.last_iso(), "2014-03-13T12:13:14Z");
    }

    #[test]
    fn rejects_unparseable() {
        assert!(matches!(
            TimeRange::resolve(Some("junk"), None),
            Err(FetchError::InvalidTimeRange(_))
        ));
        assert!(matches!(
            TimeRange::resolve(None, Some("2014-13-45")),
            Err(FetchError::InvalidTimeRange(_))
        ));
    }

    #[test]
    fn rejects_inverted_and_equal_bounds() {
        assert!(TimeRange::resolve(Some("2015-01-01"), Some("2014-01-01")).is_err());
        assert!(TimeRange::resolve(Some("2014-01-01"), Some("2014-01-01T00:00:00Z")).is_err());
    }

    #[test]
    fn contains_is_inclusive() {
        let r = TimeRange::resolve(Some("2014-01-01"), Some("2015-01-01")).unwrap();
        assert!(r.contains("2014-01-01T00:00:00Z"));
        assert!(r.contains("2015-01-01T00:00:00Z"));
        assert!(!r.contains("2015-01-01T00:00:01Z"));
        assert!(!r.contains("2013-12-31T23:59:59Z"));
    }
}
