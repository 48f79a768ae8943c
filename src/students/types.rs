//! Student record types and form validation

use crate::error::{Error, Result, ValidationErrors};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const NAME_MAX_LEN: usize = 100;
pub const PHONE_MAX_LEN: usize = 20;

/// A student record, owned by exactly one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Set once at creation
    pub created_at: DateTime<Utc>,
    /// Username of the owning account; never changes
    pub owner: String,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Overwrite the mutable fields; id, owner and creation time stay put
    pub fn apply(&mut self, fields: StudentFields) {
        self.first_name = fields.first_name;
        self.last_name = fields.last_name;
        self.email = fields.email;
        self.birth_date = fields.birth_date;
        self.phone = fields.phone;
        self.address = fields.address;
    }
}

/// Raw create/edit form as submitted
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Validated, normalized field values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl StudentForm {
    /// Check required fields and formats, returning trimmed values
    pub fn validate(&self) -> Result<StudentFields> {
        let mut errors = ValidationErrors::new();

        let first_name = required(&mut errors, "first_name", &self.first_name, Some(NAME_MAX_LEN));
        let last_name = required(&mut errors, "last_name", &self.last_name, Some(NAME_MAX_LEN));
        let email = required(&mut errors, "email", &self.email, None);
        if !email.is_empty() && !crate::notifier::is_valid_address(&email) {
            errors.add("email", "Enter a valid email address.");
        }

        let birth_date = match optional(&self.birth_date) {
            Some(raw) => match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.add("birth_date", "Enter a valid date.");
                    None
                }
            },
            None => None,
        };

        let phone = optional(&self.phone);
        if let Some(phone) = &phone {
            check_len(&mut errors, "phone", phone, PHONE_MAX_LEN);
        }

        let address = optional(&self.address);

        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }

        Ok(StudentFields {
            first_name,
            last_name,
            email,
            birth_date,
            phone,
            address,
        })
    }
}

fn required(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    max_len: Option<usize>,
) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, "This field is required.");
    } else if let Some(max) = max_len {
        check_len(errors, field, value, max);
    }
    value.to_string()
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn check_len(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                max, len
            ),
        );
    }
}
