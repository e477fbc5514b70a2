use chrono::NaiveDate;

use crate::types::{AttendanceRecord, AttendanceStatus};

/// Criteria for the attendance view. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceFilter {
    pub date: Option<NaiveDate>,
    /// Case-insensitive substring of the person's name or id.
    pub search: Option<String>,
    pub status: Option<AttendanceStatus>,
}

impl AttendanceFilter {
    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        if self.date.is_some_and(|d| d != record.date) {
            return false;
        }
        if self.status.is_some_and(|s| s != record.status) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                record.person_name.to_lowercase().contains(&needle)
                    || record.person_id.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }

    /// Matching records, in their original order.
    pub fn apply<'a>(&self, records: &'a [AttendanceRecord]) -> Vec<&'a AttendanceRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}
