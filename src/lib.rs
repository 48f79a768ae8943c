//! Roster - student records with PDF summaries and mail notifications
//!
//! Roster lets a signed-in teacher keep a private list of student records.
//! Each new record is rendered to a one-page PDF and mailed to the teacher's
//! own address; a separate lookup pipeline fetches an encyclopedia page for a
//! keyword and can mail a plain-text digest of it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     HTTP API (axum)                          │
//! │   cookie sessions · CORS · request tracing · JSON errors     │
//! └──────┬─────────────────────┬─────────────────────┬───────────┘
//!        │                     │                     │
//! ┌──────▼──────┐   ┌──────────▼──────────┐   ┌──────▼──────────┐
//! │  Accounts   │   │  Student Workflow   │   │ Content Fetcher │
//! │ register    │   │ list/create/update  │   │ fetch + extract │
//! │ login       │   │ delete/resend       │   │ digest          │
//! └──────┬──────┘   └───┬────────┬────────┘   └──────┬──────────┘
//!        │              │        │                   │
//!        │       ┌──────▼───┐ ┌──▼────────┐          │
//!        │       │ Student  │ │ Document  │          │
//!        │       │ Store    │ │ (PDF)     │          │
//!        │       └──────────┘ └──┬────────┘          │
//!        │                       │                   │
//! ┌──────▼───────────────────────▼───────────────────▼──────────┐
//! │                        Notifier                              │
//! │          smtp (lettre) · console · disabled                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`accounts`]: owner accounts, password hashing and sign-in sessions
//! - [`students`]: record store, workflow and HTTP handlers
//! - [`document`]: single-page PDF summary of a record
//! - [`notifier`]: outbound mail with typed failures
//! - [`fetcher`]: keyword page lookup and digest
//! - [`api`]: router assembly and error envelope
//! - [`config`]: configuration management

pub mod accounts;
pub mod api;
pub mod config;
pub mod document;
pub mod error;
pub mod fetcher;
pub mod notifier;
pub mod storage;
pub mod students;

pub use config::RosterConfig;
pub use error::{Error, Result};
