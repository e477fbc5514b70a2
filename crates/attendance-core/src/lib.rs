//! attendance-core — Roster, attendance records and the application state store.
//!
//! All state transitions go through [`store::reduce`]; everything else in
//! this crate either builds actions for it or reads its snapshots.

pub mod action;
pub mod attendance;
pub mod clock;
pub mod export;
pub mod filter;
pub mod roster;
pub mod store;
pub mod timesheet;
pub mod types;
pub mod validation;

pub use action::Action;
pub use attendance::{ClockError, ClockPolicy};
pub use clock::{Clock, FixedClock, SystemClock};
pub use filter::AttendanceFilter;
pub use store::{reduce, AppState, Store};
pub use timesheet::HmsDuration;
pub use types::{
    AttendanceRecord, AttendanceRecordPatch, AttendanceStatus, CurrentSession, Person,
    PersonPatch, Statistics, TrainingSession, TrainingSessionPatch, TrainingStatus,
};
pub use validation::{RegistrationForm, ValidationErrors};
