//! Application state store.
//!
//! [`reduce`] is the only transition function: a pure, total function of
//! `(state, action, now)`. [`Store`] owns the current snapshot and applies
//! actions one at a time; readers hold `Arc` snapshots and never mutate.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::clock::Clock;
use crate::roster;
use crate::types::{
    AttendanceRecord, AttendanceStatus, CurrentSession, Person, Statistics, TrainingSession,
};

/// Immutable snapshot of everything the application knows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub persons: Vec<Person>,
    pub attendance_records: Vec<AttendanceRecord>,
    pub training_sessions: Vec<TrainingSession>,
    pub current_session: CurrentSession,
    pub statistics: Statistics,
}

impl AppState {
    /// Fresh state holding the built-in roster.
    pub fn seeded(now: NaiveDateTime) -> Self {
        let persons = roster::seed_people(now);
        let statistics = Statistics {
            total_persons: persons.len() as i64,
            ..Default::default()
        };
        Self {
            persons,
            statistics,
            ..Default::default()
        }
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.persons.iter().find(|p| p.id == id)
    }

    pub fn active_persons(&self) -> impl Iterator<Item = &Person> {
        self.persons.iter().filter(|p| p.is_active)
    }
}

/// Apply one action to a state snapshot, producing the next snapshot.
///
/// Lookups by id touch only the first positional match; a miss leaves the
/// collection untouched. Statistics move only on the add/delete paths.
pub fn reduce(state: &AppState, action: Action, now: NaiveDateTime) -> AppState {
    let mut next = state.clone();

    match action {
        Action::AddPerson(person) => {
            next.persons.push(person);
            next.statistics.total_persons += 1;
        }
        Action::UpdatePerson { id, patch } => {
            if let Some(p) = next.persons.iter_mut().find(|p| p.id == id) {
                patch.apply_to(p);
            }
        }
        Action::DeletePerson { id } => {
            if let Some(pos) = next.persons.iter().position(|p| p.id == id) {
                next.persons.remove(pos);
            }
            next.statistics.total_persons -= 1;
        }
        Action::AddAttendanceRecord(record) => {
            let stats = &mut next.statistics;
            if record.clock_in.is_some() && record.clock_out.is_none() {
                stats.total_clock_ins += 1;
            }
            if record.clock_out.is_some() {
                stats.total_clock_outs += 1;
            }
            if record.status == AttendanceStatus::Present {
                stats.present_today += 1;
            }
            next.attendance_records.push(record);
        }
        Action::UpdateAttendanceRecord { id, patch } => {
            if let Some(r) = next.attendance_records.iter_mut().find(|r| r.id == id) {
                patch.apply_to(r);
            }
        }
        Action::StartTrainingSession(session) => {
            next.training_sessions.push(session);
        }
        Action::UpdateTrainingSession { id, patch } => {
            if let Some(s) = next.training_sessions.iter_mut().find(|s| s.id == id) {
                patch.apply_to(s);
            }
        }
        Action::StartAttendanceSession { lecture_duration } => {
            next.current_session = CurrentSession {
                is_active: true,
                lecture_duration: Some(lecture_duration),
                started_at: Some(now),
            };
        }
        Action::EndAttendanceSession => {
            next.current_session = CurrentSession::default();
        }
    }

    next
}

/// Owned state container with an injected clock.
pub struct Store {
    state: Arc<AppState>,
    clock: Arc<dyn Clock>,
}

impl Store {
    pub fn new(state: AppState, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(state),
            clock,
        }
    }

    /// Store seeded with the built-in roster.
    pub fn seeded(clock: Arc<dyn Clock>) -> Self {
        let state = AppState::seeded(clock.now());
        Self::new(state, clock)
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Apply an action and return the new snapshot.
    pub fn apply(&mut self, action: Action) -> Arc<AppState> {
        let kind = action.kind();
        let next = reduce(&self.state, action, self.clock.now());
        self.state = Arc::new(next);

        let stats = &self.state.statistics;
        tracing::debug!(
            action = kind,
            total_persons = stats.total_persons,
            present_today = stats.present_today,
            clock_ins = stats.total_clock_ins,
            clock_outs = stats.total_clock_outs,
            "action applied"
        );

        self.snapshot()
    }
}
