use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::timesheet::HmsDuration;

/// A registered individual on the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Caller-supplied, all-digits identifier. Unique across the roster.
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub department: Option<String>,
    /// Number of training images captured at registration.
    pub images_captured: u32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

/// Partial update for a [`Person`]. Only `Some` fields are merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub images_captured: Option<u32>,
    pub is_active: Option<bool>,
}

impl PersonPatch {
    pub fn apply_to(self, person: &mut Person) {
        if let Some(name) = self.name {
            person.name = name;
        }
        if let Some(email) = self.email {
            person.email = Some(email);
        }
        if let Some(department) = self.department {
            person.department = Some(department);
        }
        if let Some(images) = self.images_captured {
            person.images_captured = images;
        }
        if let Some(active) = self.is_active {
            person.is_active = active;
        }
    }
}

/// Attendance status of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    /// Medical certificate required (excused).
    #[serde(rename = "MCR")]
    Mcr,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "Present",
            Self::Absent => "Absent",
            Self::Late => "Late",
            Self::Mcr => "MCR",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown attendance status: {0} (expected Present, Absent, Late or MCR)")]
pub struct ParseStatusError(String);

impl FromStr for AttendanceStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            "late" => Ok(Self::Late),
            "mcr" => Ok(Self::Mcr),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

/// One attendance event for one person on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub person_id: String,
    /// Copy of the person's name at the time the record was created.
    pub person_name: String,
    pub date: NaiveDate,
    pub clock_in: Option<NaiveTime>,
    pub clock_out: Option<NaiveTime>,
    pub duration: Option<HmsDuration>,
    pub status: AttendanceStatus,
    /// Recognition confidence percentage.
    pub confidence: Option<u8>,
}

impl AttendanceRecord {
    /// Clocked in but not yet clocked out.
    pub fn is_open(&self) -> bool {
        self.clock_in.is_some() && self.clock_out.is_none()
    }
}

/// Partial update for an [`AttendanceRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecordPatch {
    pub clock_in: Option<NaiveTime>,
    pub clock_out: Option<NaiveTime>,
    pub duration: Option<HmsDuration>,
    pub status: Option<AttendanceStatus>,
    pub confidence: Option<u8>,
}

impl AttendanceRecordPatch {
    pub fn apply_to(self, record: &mut AttendanceRecord) {
        if let Some(t) = self.clock_in {
            record.clock_in = Some(t);
        }
        if let Some(t) = self.clock_out {
            record.clock_out = Some(t);
        }
        if let Some(d) = self.duration {
            record.duration = Some(d);
        }
        if let Some(s) = self.status {
            record.status = s;
        }
        if let Some(c) = self.confidence {
            record.confidence = Some(c);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingStatus {
    InProgress,
    Completed,
    Failed,
}

/// One model-training run for one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSession {
    pub id: String,
    pub person_id: String,
    pub person_name: String,
    pub images_captured: u32,
    pub total_images: u32,
    pub status: TrainingStatus,
    pub started_at: NaiveDateTime,
    pub ended_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingSessionPatch {
    pub images_captured: Option<u32>,
    pub status: Option<TrainingStatus>,
    pub ended_at: Option<NaiveDateTime>,
}

impl TrainingSessionPatch {
    pub fn apply_to(self, session: &mut TrainingSession) {
        if let Some(images) = self.images_captured {
            session.images_captured = images;
        }
        if let Some(status) = self.status {
            session.status = status;
        }
        if let Some(ended) = self.ended_at {
            session.ended_at = Some(ended);
        }
    }
}

/// The single global attendance-taking session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentSession {
    pub is_active: bool,
    /// Lecture duration as typed by the operator (`HH:MM:SS`).
    pub lecture_duration: Option<String>,
    pub started_at: Option<NaiveDateTime>,
}

/// Aggregate counters, maintained incrementally by the reducer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Signed: `DeletePerson` decrements even when no person matched.
    pub total_persons: i64,
    pub present_today: u64,
    pub total_clock_ins: u64,
    pub total_clock_outs: u64,
}
