use serde::{Deserialize, Serialize};

use crate::types::{
    AttendanceRecord, AttendanceRecordPatch, Person, PersonPatch, TrainingSession,
    TrainingSessionPatch,
};

/// State transitions accepted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    AddPerson(Person),
    UpdatePerson { id: String, patch: PersonPatch },
    DeletePerson { id: String },
    AddAttendanceRecord(AttendanceRecord),
    UpdateAttendanceRecord {
        id: String,
        patch: AttendanceRecordPatch,
    },
    StartTrainingSession(TrainingSession),
    UpdateTrainingSession {
        id: String,
        patch: TrainingSessionPatch,
    },
    StartAttendanceSession { lecture_duration: String },
    EndAttendanceSession,
}

impl Action {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddPerson(_) => "add_person",
            Self::UpdatePerson { .. } => "update_person",
            Self::DeletePerson { .. } => "delete_person",
            Self::AddAttendanceRecord(_) => "add_attendance_record",
            Self::UpdateAttendanceRecord { .. } => "update_attendance_record",
            Self::StartTrainingSession(_) => "start_training_session",
            Self::UpdateTrainingSession { .. } => "update_training_session",
            Self::StartAttendanceSession { .. } => "start_attendance_session",
            Self::EndAttendanceSession => "end_attendance_session",
        }
    }
}
