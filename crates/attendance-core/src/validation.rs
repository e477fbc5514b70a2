//! Registration form validation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::types::Person;

fn id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+$").expect("valid id pattern"))
}

fn name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z\s]+$").expect("valid name pattern"))
}

fn email_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"))
}

/// Fields of the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Id,
    Name,
    Email,
    Department,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Email => "email",
            Self::Department => "department",
        })
    }
}

/// Registration input, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub id: String,
    pub name: String,
    pub email: String,
    pub department: String,
}

/// Field-level validation messages. Submission is blocked while non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<Field, String>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    fn insert(&mut self, field: Field, message: &str) {
        self.0.entry(field).or_insert_with(|| message.to_string());
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Check the form's shape. Department is free text and never rejected.
pub fn validate(form: &RegistrationForm) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    let id = form.id.trim();
    if id.is_empty() {
        errors.insert(Field::Id, "ID is required");
    } else if !id_pattern().is_match(id) {
        errors.insert(Field::Id, "ID must contain only numbers");
    }

    let name = form.name.trim();
    if name.is_empty() {
        errors.insert(Field::Name, "Name is required");
    } else if !name_pattern().is_match(name) {
        errors.insert(Field::Name, "Name must contain only letters and spaces");
    }

    let email = form.email.trim();
    if !email.is_empty() && !email_pattern().is_match(email) {
        errors.insert(Field::Email, "Please enter a valid email address");
    }

    errors
}

/// [`validate`], plus rejection of an id already on the roster.
pub fn validate_against(form: &RegistrationForm, roster: &[Person]) -> ValidationErrors {
    let mut errors = validate(form);
    let id = form.id.trim();
    if roster.iter().any(|p| p.id == id) {
        errors.insert(Field::Id, "ID already exists");
    }
    errors
}

impl RegistrationForm {
    /// Build the roster entry once capture has finished.
    pub fn into_person(self, images_captured: u32, created_at: NaiveDateTime) -> Person {
        let optional = |s: String| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };
        Person {
            id: self.id.trim().to_string(),
            name: self.name.trim().to_string(),
            email: optional(self.email),
            department: optional(self.department),
            images_captured,
            is_active: true,
            created_at,
        }
    }
}
