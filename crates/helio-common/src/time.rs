//! Time handling for instrument queries.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HelioError, HelioResult};

/// Datetime layouts accepted by [`parse_time`], tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];

/// Date-only layouts accepted by [`parse_time`]; midnight UTC is assumed.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse an ISO-like time string into a UTC instant.
///
/// Accepts RFC 3339 (`2012-10-04T20:20:00Z`), naive datetimes with `-` or `/`
/// date separators and optional seconds/fractional seconds
/// (`2012/10/4 20:20`, `2012-10-04 20:20:30.5`) and plain dates
/// (`2012-10-04`, `2012/10/4`). Naive inputs are interpreted as UTC.
pub fn parse_time(s: &str) -> HelioResult<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)));
        }
    }

    Err(HelioError::InvalidTime(s.to_string()))
}

/// A closed time interval `[start, end]` with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeRange")]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawTimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = HelioError;

    fn try_from(raw: RawTimeRange) -> Result<Self, Self::Error> {
        TimeRange::new(raw.start, raw.end)
    }
}

impl TimeRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> HelioResult<Self> {
        if start > end {
            return Err(HelioError::ReversedRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse both ends with [`parse_time`].
    pub fn parse(start: &str, end: &str) -> HelioResult<Self> {
        Self::new(parse_time(start)?, parse_time(end)?)
    }

    /// Range covering one whole UTC day, ending one millisecond before the
    /// next midnight.
    pub fn whole_day(date: NaiveDate) -> Self {
        let start = Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN));
        let end = start + Duration::days(1) - Duration::milliseconds(1);
        Self { start, end }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, dt: &DateTime<Utc>) -> bool {
        dt >= &self.start && dt <= &self.end
    }

    /// True when the two closed intervals share at least one instant.
    pub fn intersects(&self, other: &TimeRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Every calendar day touched by the range, first to last.
    ///
    /// A range ending exactly at midnight includes that final day.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let last = self.end.date_naive();
        self.start
            .date_naive()
            .iter_days()
            .take_while(move |d| *d <= last)
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.end.format("%Y-%m-%d %H:%M:%S%.3f")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse_time("2024-01-15T12:00:00Z").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = parse_time("2024-01-15T12:00:00+02:00").unwrap();
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_parse_slash_date_unpadded() {
        let dt = parse_time("2012/10/4").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2012, 10, 4));
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_parse_slash_datetime_without_seconds() {
        let dt = parse_time("1995/06/03 1:00").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (1995, 6, 3));
        assert_eq!((dt.hour(), dt.minute()), (1, 0));
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let dt = parse_time("2012-10-04 20:20:30.250").unwrap();
        assert_eq!(dt.second(), 30);
        assert_eq!(dt.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(parse_time("yesterday"), Err(HelioError::InvalidTime(_))));
    }

    #[test]
    fn test_reversed_range_rejected() {
        let result = TimeRange::parse("2012/10/5", "2012/10/4");
        assert!(matches!(result, Err(HelioError::ReversedRange { .. })));
    }

    #[test]
    fn test_days_include_midnight_end() {
        let tr = TimeRange::parse("2012/10/4", "2012/10/5").unwrap();
        let days: Vec<_> = tr.days().collect();
        assert_eq!(days.len(), 2);
        assert_eq!(days[1], NaiveDate::from_ymd_opt(2012, 10, 5).unwrap());
    }

    #[test]
    fn test_days_single_instant() {
        let tr = TimeRange::parse("2012/10/4 20:20", "2012/10/4 20:20").unwrap();
        assert_eq!(tr.days().count(), 1);
    }

    #[test]
    fn test_whole_day_ends_before_midnight() {
        let day = TimeRange::whole_day(NaiveDate::from_ymd_opt(2016, 1, 1).unwrap());
        assert_eq!(day.end().format("%H:%M:%S%.3f").to_string(), "23:59:59.999");
        assert_eq!(day.duration(), Duration::days(1) - Duration::milliseconds(1));
    }

    #[test]
    fn test_deserialize_validates_order() {
        let json = r#"{"start":"2012-10-05T00:00:00Z","end":"2012-10-04T00:00:00Z"}"#;
        assert!(serde_json::from_str::<TimeRange>(json).is_err());
    }
}
