//! Account store with file-based JSON persistence
//!
//! Directory layout:
//! ```text
//! <base>/accounts/
//! ├── <username>.json
//! └── ...
//! ```

use crate::accounts::password::{hash_password, verify_password};
use crate::accounts::types::*;
use crate::error::{Error, Result, ValidationErrors};
use crate::storage;
use chrono::Utc;
use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Letters, digits and `@ . + - _`
const USERNAME_PATTERN: &str = r"^[\w.@+-]+$";

/// Owner accounts, cached in memory and written through to JSON files
pub struct AccountStore {
    dir: PathBuf,
    accounts: Arc<RwLock<Vec<Account>>>,
    username_pattern: Regex,
}

impl AccountStore {
    /// Open (or create) the store at `dir`
    pub async fn new(dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&dir).await?;

        let username_pattern = Regex::new(USERNAME_PATTERN)
            .map_err(|e| Error::Internal(format!("Invalid username pattern: {}", e)))?;

        let accounts: Vec<Account> = storage::load_json_files(&dir);
        tracing::debug!(count = accounts.len(), "Loaded accounts");

        Ok(Self {
            dir,
            accounts: Arc::new(RwLock::new(accounts)),
            username_pattern,
        })
    }

    /// Look up an account by username
    pub async fn get(&self, username: &str) -> Option<Account> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|a| a.username == username)
            .cloned()
    }

    /// Validate a registration form and create the account
    pub async fn register(&self, form: RegisterForm) -> Result<Account> {
        let mut errors = form.validate();
        let username = form.username.trim().to_string();

        if !username.is_empty() && !self.username_pattern.is_match(&username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }

        // Argon2 is CPU-bound; keep it off the async workers
        let password = form.password1.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| Error::Internal(format!("Password hashing task failed: {}", e)))??;

        let mut accounts = self.accounts.write().await;
        if accounts.iter().any(|a| a.username == username) {
            let mut errors = ValidationErrors::new();
            errors.add("username", "A user with that username already exists.");
            return Err(Error::Validation(errors));
        }

        let account = Account {
            username,
            email: Some(form.email.trim().to_string()),
            password_hash,
            date_joined: Utc::now(),
        };

        storage::write_json(&self.dir, &account.username, &account).await?;
        accounts.push(account.clone());

        tracing::info!(username = %account.username, "Account registered");
        Ok(account)
    }

    /// Check a username/password pair
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Account> {
        let account = self
            .get(username.trim())
            .await
            .ok_or(Error::InvalidCredentials)?;

        let password = password.to_string();
        let hash = account.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| Error::Internal(format!("Password check task failed: {}", e)))??;

        if matches {
            Ok(account)
        } else {
            tracing::debug!(username = %account.username, "Password mismatch");
            Err(Error::InvalidCredentials)
        }
    }

    /// Replace the email on file (an empty value clears it)
    pub async fn set_email(&self, username: &str, email: Option<String>) -> Result<Account> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .iter_mut()
            .find(|a| a.username == username)
            .ok_or(Error::NotFound)?;

        let mut updated = account.clone();
        updated.email = email.filter(|e| !e.trim().is_empty());
        storage::write_json(&self.dir, &updated.username, &updated).await?;
        *account = updated.clone();
        Ok(updated)
    }
}
