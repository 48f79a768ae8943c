//! Account types and form validation

use crate::error::{Result, ValidationErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

/// A registered owner, as persisted on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub email: Option<String>,
    /// Argon2id PHC string
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

impl Account {
    /// Public view without credentials
    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            username: self.username.clone(),
            email: self.email.clone(),
            date_joined: self.date_joined,
        }
    }
}

/// Account data safe to return over HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub username: String,
    pub email: Option<String>,
    pub date_joined: DateTime<Utc>,
}

/// Registration form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl RegisterForm {
    /// Field checks that need no store access. Username charset and
    /// uniqueness are checked by the store.
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        let username = self.username.trim();
        if username.is_empty() {
            errors.add("username", "This field is required.");
        } else if username.chars().count() > USERNAME_MAX_LEN {
            errors.add(
                "username",
                format!("Ensure this value has at most {} characters.", USERNAME_MAX_LEN),
            );
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.add("email", "This field is required.");
        } else if !crate::notifier::is_valid_address(email) {
            errors.add("email", "Enter a valid email address.");
        }

        if self.password1.is_empty() {
            errors.add("password1", "This field is required.");
        }
        if self.password2.is_empty() {
            errors.add("password2", "This field is required.");
        }
        if !self.password1.is_empty() && !self.password2.is_empty() {
            if self.password1 != self.password2 {
                errors.add("password2", "The two password fields didn't match.");
            } else {
                if self.password1.chars().count() < PASSWORD_MIN_LEN {
                    errors.add(
                        "password2",
                        format!(
                            "This password is too short. It must contain at least {} characters.",
                            PASSWORD_MIN_LEN
                        ),
                    );
                }
                if self.password1.chars().all(|c| c.is_ascii_digit()) {
                    errors.add("password2", "This password is entirely numeric.");
                }
            }
        }

        errors
    }
}

/// Login form
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Profile form; a blank email clears the address on file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub email: String,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<Option<String>> {
        let email = self.email.trim();
        if email.is_empty() {
            return Ok(None);
        }

        let mut errors = ValidationErrors::new();
        if !crate::notifier::is_valid_address(email) {
            errors.add("email", "Enter a valid email address.");
        }
        errors.into_result()?;
        Ok(Some(email.to_string()))
    }
}
