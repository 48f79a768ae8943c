//! Roster configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `mail.smtp.password`
pub const SMTP_PASSWORD_ENV: &str = "ROSTER_SMTP_PASSWORD";

/// Main Roster configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Outbound mail configuration
    pub mail: MailConfig,

    /// Content fetcher configuration
    pub fetcher: FetcherConfig,
}

impl RosterConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Fill secrets that are allowed to come from the environment
    pub fn apply_env(&mut self) {
        if let Ok(password) = std::env::var(SMTP_PASSWORD_ENV) {
            if !password.is_empty() {
                self.mail.smtp.password = Some(password);
            }
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed CORS origins (empty = any)
    pub cors_origins: Vec<String>,

    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: Vec::new(),
            secure_cookies: false,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base directory for all persisted data
    pub base_dir: PathBuf,
}

impl StorageConfig {
    /// Directory holding student record files
    pub fn students_dir(&self) -> PathBuf {
        self.base_dir.join("students")
    }

    /// Directory holding account files
    pub fn accounts_dir(&self) -> PathBuf {
        self.base_dir.join("accounts")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: dirs_next::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".roster"),
        }
    }
}

/// Mail delivery backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailBackend {
    /// Deliver through an SMTP relay
    Smtp,
    /// Write messages to the log instead of delivering them
    Console,
    /// Placeholder; every send is refused
    Disabled,
}

impl std::fmt::Display for MailBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Smtp => write!(f, "smtp"),
            Self::Console => write!(f, "console"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

/// Outbound mail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Which backend delivers mail
    pub backend: MailBackend,

    /// Sender address; falls back to `smtp.username`, then `DEFAULT_SENDER`
    pub from: Option<String>,

    /// SMTP relay settings
    pub smtp: SmtpConfig,
}

/// Sender used when neither `from` nor `smtp.username` is set
pub const DEFAULT_SENDER: &str = "webmaster@localhost";

impl MailConfig {
    /// Resolve the sender address
    pub fn sender(&self) -> &str {
        let non_blank = |s: &&str| !s.trim().is_empty();
        self.from
            .as_deref()
            .filter(non_blank)
            .or(self.smtp.username.as_deref().filter(non_blank))
            .unwrap_or(DEFAULT_SENDER)
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            backend: MailBackend::Console,
            from: None,
            smtp: SmtpConfig::default(),
        }
    }
}

/// SMTP relay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// Relay host
    pub host: String,

    /// Relay port (STARTTLS)
    pub port: u16,

    /// Login user
    pub username: Option<String>,

    /// Login password (prefer `ROSTER_SMTP_PASSWORD`)
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: None,
            password: None,
        }
    }
}

/// Content fetcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Page URL prefix; the keyword is appended with spaces as underscores
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://es.wikipedia.org/wiki/".to_string(),
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
                .to_string(),
        }
    }
}
