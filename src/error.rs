//! Roster error types

use std::collections::BTreeMap;
use thiserror::Error;

/// Roster error type
#[derive(Error, Debug)]
pub enum Error {
    /// Form input rejected; carries per-field messages
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Record absent or owned by someone else
    #[error("Not found")]
    NotFound,

    /// Username/password pair did not match an account
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// No signed-in owner on the request
    #[error("Authentication required")]
    Unauthorized,

    /// Outbound mail failure
    #[error(transparent)]
    Notify(#[from] NotifyError),

    /// Content fetch failure (network, body or parse)
    #[error("Fetch failed: {0}")]
    FetchFailure(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Document rendering error
    #[error("Document error: {0}")]
    Document(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures of the outbound mail channel.
///
/// These never undo a committed record mutation; callers turn them into
/// warnings or into a dedicated error response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The acting owner has no email address on file
    #[error("No recipient address registered for this account")]
    NoRecipient,

    /// Mail backend is the non-delivering placeholder or lacks a sender
    #[error("Mail backend not configured: {0}")]
    BackendUnconfigured(String),

    /// Transport rejected the credentials
    #[error("Mail authentication failed: {0}")]
    AuthFailure(String),

    /// Any other transport failure
    #[error("Mail delivery failed: {0}")]
    DeliveryFailure(String),
}

impl NotifyError {
    /// Stable machine-readable code used in API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoRecipient => "NO_RECIPIENT",
            Self::BackendUnconfigured(_) => "MAIL_NOT_CONFIGURED",
            Self::AuthFailure(_) => "MAIL_AUTH_FAILED",
            Self::DeliveryFailure(_) => "MAIL_DELIVERY_FAILED",
        }
    }

    /// Human-readable explanation with a hint at the fix
    pub fn user_message(&self) -> String {
        match self {
            Self::NoRecipient => {
                "You have no email address registered. Add one to your profile first.".to_string()
            }
            Self::BackendUnconfigured(_) => {
                "Mail is not configured. Set the [mail] section of the configuration file and restart the server."
                    .to_string()
            }
            Self::AuthFailure(_) => {
                "The mail server rejected the credentials. Check mail.smtp.username and ROSTER_SMTP_PASSWORD."
                    .to_string()
            }
            Self::DeliveryFailure(msg) => format!("Error sending the email: {}", msg),
        }
    }
}

/// Field-level validation messages, keyed by form field name
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether any message was recorded for `field`
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    /// `Ok(())` when nothing was recorded, otherwise `Error::Validation`
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, msgs)| format!("{}: {}", field, msgs.join("; ")))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Result type alias for Roster operations
pub type Result<T> = std::result::Result<T, Error>;
