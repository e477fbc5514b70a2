//! Built-in seed roster.
//!
//! The default people and the department choice list are embedded at
//! compile time from `contrib/seed/roster.toml`. Every fresh store starts
//! from this roster; nothing is written back.

use std::sync::OnceLock;

use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;

use crate::types::Person;

const SEED_ROSTER: &str = include_str!("../../../contrib/seed/roster.toml");

static SEED: OnceLock<SeedFile> = OnceLock::new();

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("bad seed roster TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("duplicate person id in seed roster: {0}")]
    DuplicateId(String),
}

/// Top-level structure of the seed file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub departments: Vec<String>,
    #[serde(default, rename = "person")]
    pub people: Vec<SeedPerson>,
}

/// One `[[person]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedPerson {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub department: Option<String>,
    #[serde(default)]
    pub images_captured: u32,
}

impl SeedPerson {
    fn to_person(&self, created_at: NaiveDateTime) -> Person {
        Person {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            department: self.department.clone(),
            images_captured: self.images_captured,
            is_active: true,
            created_at,
        }
    }
}

/// Parse a seed file, rejecting duplicate ids.
pub fn parse_seed(src: &str) -> Result<SeedFile, SeedError> {
    let file: SeedFile = toml::from_str(src)?;
    for (i, p) in file.people.iter().enumerate() {
        if file.people[..i].iter().any(|q| q.id == p.id) {
            return Err(SeedError::DuplicateId(p.id.clone()));
        }
    }
    Ok(file)
}

fn seed_file() -> &'static SeedFile {
    SEED.get_or_init(|| match parse_seed(SEED_ROSTER) {
        Ok(file) => file,
        Err(e) => {
            tracing::error!(error = %e, "falling back to an empty roster");
            SeedFile::default()
        }
    })
}

/// The default roster, stamped with `created_at`.
pub fn seed_people(created_at: NaiveDateTime) -> Vec<Person> {
    seed_file()
        .people
        .iter()
        .map(|p| p.to_person(created_at))
        .collect()
}

/// Department choices offered at registration.
pub fn departments() -> &'static [String] {
    &seed_file().departments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_seed_parses() {
        let file = parse_seed(SEED_ROSTER).unwrap();
        assert_eq!(file.people.len(), 3);
        assert!(!file.departments.is_empty());
        assert!(file
            .people
            .iter()
            .all(|p| !p.id.is_empty() && p.id.bytes().all(|b| b.is_ascii_digit())));
    }

    #[test]
    fn test_seed_rejects_duplicate_ids() {
        let src = r#"
            [[person]]
            id = "1"
            name = "A"

            [[person]]
            id = "1"
            name = "B"
        "#;
        assert!(matches!(parse_seed(src), Err(SeedError::DuplicateId(id)) if id == "1"));
    }

    #[test]
    fn test_seed_people_are_active() {
        let now = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let people = seed_people(now);
        assert_eq!(people.len(), 3);
        assert!(people.iter().all(|p| p.is_active && p.created_at == now));
    }
}
