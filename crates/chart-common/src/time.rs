//! Analysis time handling.
//!
//! Analysis runs are keyed on the observation time expressed in the chart
//! region's local zone. Asia/Kathmandu carries a fixed +05:45 offset with no
//! daylight saving, so a `FixedOffset` represents it exactly.

use crate::error::ChartError;
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Observation time of an analysis run, in the local analysis zone.
pub type AnalysisTime = DateTime<FixedOffset>;

/// IANA name of the analysis zone, for logs and feature properties.
pub const ANALYSIS_ZONE: &str = "Asia/Kathmandu";

/// The fixed UTC offset of the analysis zone (+05:45).
pub fn analysis_offset() -> FixedOffset {
    // 5h45m east is always a representable offset
    FixedOffset::east_opt(5 * 3600 + 45 * 60).expect("valid fixed offset")
}

/// Resolve the observation time for a run.
///
/// With no explicit time, the current time in the analysis zone truncated to
/// the hour is used. An explicit time must be ISO-8601 (trailing `Z`
/// accepted) and is converted to the analysis zone untruncated.
pub fn resolve_observation_time(input: Option<&str>) -> Result<AnalysisTime, ChartError> {
    match input {
        None => Ok(truncate_to_hour(Utc::now().with_timezone(&analysis_offset()))),
        Some(s) => parse_iso8601(s),
    }
}

/// Parse an ISO-8601 timestamp into the analysis zone.
pub fn parse_iso8601(s: &str) -> Result<AnalysisTime, ChartError> {
    // Full datetime with offset or trailing Z
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&analysis_offset()));
    }

    // Without offset: interpret as UTC
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc
            .from_utc_datetime(&ndt)
            .with_timezone(&analysis_offset()));
    }

    Err(ChartError::InvalidTimeFormat(s.to_string()))
}

/// Zero out minutes, seconds and sub-seconds.
pub fn truncate_to_hour(dt: AnalysisTime) -> AnalysisTime {
    dt.with_minute(0)
        .and_then(|d| d.with_second(0))
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt)
}

/// A UTC time window for store queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window of `minutes` on either side of `center`.
    pub fn around(center: AnalysisTime, minutes: i64) -> Self {
        let center = center.with_timezone(&Utc);
        Self {
            start: center - Duration::minutes(minutes),
            end: center + Duration::minutes(minutes),
        }
    }

    pub fn contains(&self, dt: &DateTime<Utc>) -> bool {
        dt >= &self.start && dt <= &self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trailing_z() {
        let t = parse_iso8601("2025-06-15T12:00:00Z").unwrap();
        // 12:00Z is 17:45 in Kathmandu
        assert_eq!(t.hour(), 17);
        assert_eq!(t.minute(), 45);
    }

    #[test]
    fn test_parse_naive_assumes_utc() {
        let z = parse_iso8601("2025-06-15T12:00:00Z").unwrap();
        let naive = parse_iso8601("2025-06-15T12:00:00").unwrap();
        assert_eq!(z, naive);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_iso8601("yesterday at noon").is_err());
        assert!(parse_iso8601("2025-13-40T99:00:00Z").is_err());
    }

    #[test]
    fn test_truncate_to_hour() {
        let t = parse_iso8601("2025-06-15T12:34:56Z").unwrap();
        let truncated = truncate_to_hour(t);
        assert_eq!(truncated.minute(), 0);
        assert_eq!(truncated.second(), 0);
    }

    #[test]
    fn test_window_contains_center() {
        let t = parse_iso8601("2025-06-15T12:00:00Z").unwrap();
        let window = TimeRange::around(t, 60);
        assert!(window.contains(&t.with_timezone(&Utc)));
        assert_eq!(window.end - window.start, Duration::minutes(120));
    }
}
