//! Clock-in / clock-out workflow.
//!
//! Turns a recognized person into the store action that records it. The
//! store accepts any record; the one-open-record-per-person-per-day rule
//! is enforced here, before anything is dispatched.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::action::Action;
use crate::store::AppState;
use crate::timesheet::{self, HmsDuration, TimesheetError};
use crate::types::{AttendanceRecord, AttendanceRecordPatch};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("person {0} is not on the roster")]
    UnknownPerson(String),
    #[error("{name} is already clocked in today")]
    AlreadyClockedIn { person_id: String, name: String },
    #[error("No clock-in record found for today")]
    NoOpenRecord { person_id: String },
    #[error(transparent)]
    Timesheet(#[from] TimesheetError),
}

/// Thresholds used to classify attendance status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockPolicy {
    /// Clock-ins later than this after session start are `Late`.
    pub late_grace: HmsDuration,
    /// Allowed deviation of the worked duration from the lecture duration.
    pub lecture_tolerance: HmsDuration,
}

impl Default for ClockPolicy {
    fn default() -> Self {
        Self {
            late_grace: HmsDuration::from_mins(15),
            lecture_tolerance: HmsDuration::from_mins(5),
        }
    }
}

/// Today's open record for a person, first positional match.
pub fn open_record<'a>(
    state: &'a AppState,
    person_id: &str,
    now: NaiveDateTime,
) -> Option<&'a AttendanceRecord> {
    let today = now.date();
    state
        .attendance_records
        .iter()
        .find(|r| r.person_id == person_id && r.date == today && r.is_open())
}

/// Build the record for a clock-in.
pub fn clock_in(
    state: &AppState,
    person_id: &str,
    confidence: Option<u8>,
    now: NaiveDateTime,
    policy: &ClockPolicy,
) -> Result<Action, ClockError> {
    let person = state
        .person(person_id)
        .ok_or_else(|| ClockError::UnknownPerson(person_id.to_string()))?;

    if open_record(state, person_id, now).is_some() {
        return Err(ClockError::AlreadyClockedIn {
            person_id: person.id.clone(),
            name: person.name.clone(),
        });
    }

    let session_start = state
        .current_session
        .is_active
        .then_some(state.current_session.started_at)
        .flatten();
    let status = timesheet::classify_arrival(session_start, now, policy.late_grace);

    tracing::info!(person = %person.id, status = %status, ?confidence, "clock-in");

    Ok(Action::AddAttendanceRecord(AttendanceRecord {
        id: uuid::Uuid::new_v4().to_string(),
        person_id: person.id.clone(),
        person_name: person.name.clone(),
        date: now.date(),
        clock_in: Some(now.time()),
        clock_out: None,
        duration: None,
        status,
        confidence,
    }))
}

/// Close today's open record for a person.
pub fn clock_out(
    state: &AppState,
    person_id: &str,
    now: NaiveDateTime,
    policy: &ClockPolicy,
) -> Result<Action, ClockError> {
    let record = open_record(state, person_id, now).ok_or_else(|| ClockError::NoOpenRecord {
        person_id: person_id.to_string(),
    })?;
    let clock_in = record.clock_in.ok_or_else(|| ClockError::NoOpenRecord {
        person_id: person_id.to_string(),
    })?;

    let clock_out = now.time();
    let worked = timesheet::duration_between(clock_in, clock_out)?;
    let status = timesheet::classify_completion(
        state.current_session.lecture_duration.as_deref(),
        worked,
        policy.lecture_tolerance,
        record.status,
    );

    tracing::info!(person = person_id, duration = %worked, status = %status, "clock-out");

    Ok(Action::UpdateAttendanceRecord {
        id: record.id.clone(),
        patch: AttendanceRecordPatch {
            clock_out: Some(clock_out),
            duration: Some(worked),
            status: Some(status),
            ..Default::default()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::reduce;
    use crate::types::AttendanceStatus;
    use chrono::{NaiveDate, NaiveTime};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 9, 2)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn seeded() -> AppState {
        AppState::seeded(at(8, 0, 0))
    }

    #[test]
    fn test_clock_in_builds_open_record() {
        let state = seeded();
        let action = clock_in(&state, "1001", Some(91), at(9, 0, 0), &ClockPolicy::default()).unwrap();
        let Action::AddAttendanceRecord(record) = action else {
            panic!("expected AddAttendanceRecord");
        };
        assert_eq!(record.person_name, "John Doe");
        assert_eq!(record.date, at(9, 0, 0).date());
        assert_eq!(record.clock_in, NaiveTime::from_hms_opt(9, 0, 0));
        assert!(record.is_open());
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.confidence, Some(91));
    }

    #[test]
    fn test_clock_in_unknown_person() {
        let err = clock_in(&seeded(), "42", None, at(9, 0, 0), &ClockPolicy::default()).unwrap_err();
        assert_eq!(err, ClockError::UnknownPerson("42".into()));
    }

    #[test]
    fn test_second_clock_in_rejected() {
        let policy = ClockPolicy::default();
        let state = seeded();
        let action = clock_in(&state, "1001", None, at(9, 0, 0), &policy).unwrap();
        let state = reduce(&state, action, at(9, 0, 0));

        let err = clock_in(&state, "1001", None, at(9, 5, 0), &policy).unwrap_err();
        assert!(matches!(err, ClockError::AlreadyClockedIn { .. }));
    }

    #[test]
    fn test_late_arrival_during_session() {
        let policy = ClockPolicy::default();
        let state = reduce(
            &seeded(),
            Action::StartAttendanceSession {
                lecture_duration: "01:00:00".into(),
            },
            at(9, 0, 0),
        );
        let Action::AddAttendanceRecord(record) =
            clock_in(&state, "1002", None, at(9, 20, 0), &policy).unwrap()
        else {
            panic!("expected AddAttendanceRecord");
        };
        assert_eq!(record.status, AttendanceStatus::Late);
    }

    #[test]
    fn test_clock_out_without_record() {
        let err = clock_out(&seeded(), "1001", at(10, 0, 0), &ClockPolicy::default()).unwrap_err();
        assert_eq!(err.to_string(), "No clock-in record found for today");
    }

    #[test]
    fn test_clock_out_ignores_yesterday() {
        let policy = ClockPolicy::default();
        let yesterday = at(9, 0, 0) - chrono::Duration::days(1);
        let state = seeded();
        let action = clock_in(&state, "1001", None, yesterday, &policy).unwrap();
        let state = reduce(&state, action, yesterday);

        let err = clock_out(&state, "1001", at(10, 0, 0), &policy).unwrap_err();
        assert!(matches!(err, ClockError::NoOpenRecord { .. }));
    }

    #[test]
    fn test_clock_out_computes_duration() {
        let policy = ClockPolicy::default();
        let state = seeded();
        let action = clock_in(&state, "1001", None, at(9, 0, 0), &policy).unwrap();
        let state = reduce(&state, action, at(9, 0, 0));

        let action = clock_out(&state, "1001", at(10, 30, 15), &policy).unwrap();
        let state = reduce(&state, action, at(10, 30, 15));

        let record = &state.attendance_records[0];
        assert_eq!(record.duration.unwrap().to_string(), "01:30:15");
        assert_eq!(record.clock_out, NaiveTime::from_hms_opt(10, 30, 15));
        assert_eq!(record.status, AttendanceStatus::Present);
        assert!(!record.is_open());
        assert_eq!(state.statistics.total_clock_ins, 1);
        assert_eq!(state.statistics.total_clock_outs, 0);
    }

    #[test]
    fn test_short_stay_against_lecture_is_mcr() {
        let policy = ClockPolicy::default();
        let state = reduce(
            &seeded(),
            Action::StartAttendanceSession {
                lecture_duration: "01:00:00".into(),
            },
            at(9, 0, 0),
        );
        let action = clock_in(&state, "1003", None, at(9, 0, 0), &policy).unwrap();
        let state = reduce(&state, action, at(9, 0, 0));
        let action = clock_out(&state, "1003", at(9, 20, 0), &policy).unwrap();
        let state = reduce(&state, action, at(9, 20, 0));

        assert_eq!(state.attendance_records[0].status, AttendanceStatus::Mcr);
        // Statistics are not recomputed on update.
        assert_eq!(state.statistics.present_today, 1);
    }
}
