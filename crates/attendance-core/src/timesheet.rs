//! Time-of-day arithmetic — worked durations and status classification.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::types::AttendanceStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimesheetError {
    #[error("invalid duration {0:?}: expected HH:MM:SS")]
    InvalidDuration(String),
    #[error("clock-out {clock_out} is earlier than clock-in {clock_in}")]
    ClockOutBeforeClockIn {
        clock_in: NaiveTime,
        clock_out: NaiveTime,
    },
}

/// Whole-second duration rendered as `HH:MM:SS`.
///
/// Hours are zero padded to two digits and may exceed 24.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HmsDuration {
    seconds: u32,
}

impl HmsDuration {
    pub const fn from_secs(seconds: u32) -> Self {
        Self { seconds }
    }

    pub const fn from_mins(minutes: u32) -> Self {
        Self {
            seconds: minutes.saturating_mul(60),
        }
    }

    pub fn as_secs(&self) -> u32 {
        self.seconds
    }

    /// Absolute difference between two durations.
    pub fn abs_diff(&self, other: HmsDuration) -> HmsDuration {
        HmsDuration::from_secs(self.seconds.abs_diff(other.seconds))
    }
}

impl fmt::Display for HmsDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = self.seconds / 3600;
        let m = (self.seconds % 3600) / 60;
        let s = self.seconds % 60;
        write!(f, "{h:02}:{m:02}:{s:02}")
    }
}

impl FromStr for HmsDuration {
    type Err = TimesheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TimesheetError::InvalidDuration(s.to_string());

        let mut parts = s.trim().split(':');
        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let field = |v: &str| -> Option<u32> {
            if v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            v.parse().ok()
        };

        let h = field(h).ok_or_else(invalid)?;
        let m = field(m).filter(|m| *m < 60).ok_or_else(invalid)?;
        let sec = field(sec).filter(|s| *s < 60).ok_or_else(invalid)?;

        h.checked_mul(3600)
            .and_then(|hs| hs.checked_add(m * 60 + sec))
            .map(HmsDuration::from_secs)
            .ok_or_else(invalid)
    }
}

impl Serialize for HmsDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HmsDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Time worked between a clock-in and a clock-out on the same day.
pub fn duration_between(
    clock_in: NaiveTime,
    clock_out: NaiveTime,
) -> Result<HmsDuration, TimesheetError> {
    if clock_out < clock_in {
        return Err(TimesheetError::ClockOutBeforeClockIn {
            clock_in,
            clock_out,
        });
    }
    let secs = (clock_out - clock_in).num_seconds();
    Ok(HmsDuration::from_secs(secs as u32))
}

/// Status on arrival: late when the clock-in falls more than `grace`
/// after the session started.
pub fn classify_arrival(
    session_start: Option<NaiveDateTime>,
    clock_in: NaiveDateTime,
    grace: HmsDuration,
) -> AttendanceStatus {
    match session_start {
        Some(start) if (clock_in - start).num_seconds() > i64::from(grace.as_secs()) => {
            AttendanceStatus::Late
        }
        _ => AttendanceStatus::Present,
    }
}

/// Status on clock-out, measured against the configured lecture duration.
///
/// A worked duration within `tolerance` of the lecture keeps `current`;
/// anything further off becomes MCR. A missing or unparsable lecture
/// duration keeps `current`.
pub fn classify_completion(
    lecture: Option<&str>,
    worked: HmsDuration,
    tolerance: HmsDuration,
    current: AttendanceStatus,
) -> AttendanceStatus {
    let Some(raw) = lecture else {
        return current;
    };
    match raw.parse::<HmsDuration>() {
        Ok(lecture) if lecture.abs_diff(worked) <= tolerance => current,
        Ok(_) => AttendanceStatus::Mcr,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring lecture duration");
            current
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_duration_between() {
        let d = duration_between(t(9, 0, 0), t(10, 30, 15)).unwrap();
        assert_eq!(d.to_string(), "01:30:15");
    }

    #[test]
    fn test_duration_zero() {
        let d = duration_between(t(9, 0, 0), t(9, 0, 0)).unwrap();
        assert_eq!(d.to_string(), "00:00:00");
    }

    #[test]
    fn test_duration_clock_out_before_clock_in() {
        let err = duration_between(t(10, 0, 0), t(9, 0, 0)).unwrap_err();
        assert!(matches!(err, TimesheetError::ClockOutBeforeClockIn { .. }));
    }

    #[test]
    fn test_from_mins_saturates() {
        assert_eq!(HmsDuration::from_mins(90).as_secs(), 5400);
        assert_eq!(HmsDuration::from_mins(u32::MAX).as_secs(), u32::MAX);
    }

    #[test]
    fn test_parse_duration() {
        let d: HmsDuration = "01:00:00".parse().unwrap();
        assert_eq!(d.as_secs(), 3600);
        let long: HmsDuration = "36:05:09".parse().unwrap();
        assert_eq!(long.to_string(), "36:05:09");
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        for raw in ["", "1:00", "01:60:00", "aa:bb:cc", "01:00:00:00", "-1:00:00"] {
            assert!(raw.parse::<HmsDuration>().is_err(), "{raw:?} should fail");
        }
    }

    #[test]
    fn test_arrival_on_time_and_late() {
        let grace = HmsDuration::from_mins(15);
        assert_eq!(
            classify_arrival(Some(at(9, 0)), at(9, 15), grace),
            AttendanceStatus::Present
        );
        assert_eq!(
            classify_arrival(Some(at(9, 0)), at(9, 16), grace),
            AttendanceStatus::Late
        );
        assert_eq!(
            classify_arrival(None, at(11, 0), grace),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn test_completion_within_tolerance() {
        let status = classify_completion(
            Some("01:00:00"),
            HmsDuration::from_mins(57),
            HmsDuration::from_mins(5),
            AttendanceStatus::Present,
        );
        assert_eq!(status, AttendanceStatus::Present);
    }

    #[test]
    fn test_completion_keeps_late() {
        let status = classify_completion(
            Some("01:00:00"),
            HmsDuration::from_mins(62),
            HmsDuration::from_mins(5),
            AttendanceStatus::Late,
        );
        assert_eq!(status, AttendanceStatus::Late);
    }

    #[test]
    fn test_completion_outside_tolerance_is_mcr() {
        let status = classify_completion(
            Some("01:00:00"),
            HmsDuration::from_mins(20),
            HmsDuration::from_mins(5),
            AttendanceStatus::Present,
        );
        assert_eq!(status, AttendanceStatus::Mcr);
    }

    #[test]
    fn test_completion_without_lecture() {
        let tol = HmsDuration::from_mins(5);
        let worked = HmsDuration::from_mins(3);
        assert_eq!(
            classify_completion(None, worked, tol, AttendanceStatus::Present),
            AttendanceStatus::Present
        );
        assert_eq!(
            classify_completion(Some("soon"), worked, tol, AttendanceStatus::Present),
            AttendanceStatus::Present
        );
    }
}
