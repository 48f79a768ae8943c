//! HTTP handlers for student records
//!
//! - GET  /dashboard     : owner's records, newest first
//! - POST /create        : create record, mail its PDF to the owner
//! - GET  /edit/:id      : one owned record
//! - POST /edit/:id      : update record
//! - POST /delete/:id    : delete record
//! - POST /send-pdf/:id  : re-send the PDF summary

use crate::accounts::{current_owner, AccountStore};
use crate::config::MailBackend;
use crate::error::{Error, Result};
use crate::students::types::StudentForm;
use crate::students::workflow::StudentWorkflow;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use std::sync::Arc;
use tower_sessions::Session;

/// Shared state for student handlers
#[derive(Clone)]
pub struct StudentsState {
    pub accounts: Arc<AccountStore>,
    pub workflow: Arc<StudentWorkflow>,
}

/// Create the students router
pub fn students_router(state: StudentsState) -> Router {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/create", post(create_student))
        .route("/edit/:id", get(get_student).post(update_student))
        .route("/delete/:id", post(delete_student))
        .route("/send-pdf/:id", post(send_pdf))
        .with_state(state)
}

/// Record ids come from the path as text; anything that is not a `u64`
/// names no record
fn record_id(raw: &str) -> Result<u64> {
    raw.parse().map_err(|_| Error::NotFound)
}

fn sent_message(backend: MailBackend, recipient: &str) -> String {
    match backend {
        MailBackend::Console => format!(
            "PDF generated. The email was written to the server log (recipient: {}).",
            recipient
        ),
        _ => format!("PDF sent to {}.", recipient),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /dashboard
async fn dashboard(
    State(state): State<StudentsState>,
    session: Session,
) -> Result<impl IntoResponse> {
    let owner = current_owner(&state.accounts, &session).await?;
    let students = state.workflow.list(&owner).await;
    Ok(Json(serde_json::json!({
        "owner": owner.profile(),
        "students": students,
    })))
}

/// POST /create
async fn create_student(
    State(state): State<StudentsState>,
    session: Session,
    Form(form): Form<StudentForm>,
) -> Result<impl IntoResponse> {
    let owner = current_owner(&state.accounts, &session).await?;
    let outcome = state.workflow.create(&owner, form).await?;
    let name = outcome.student.full_name();

    let mut messages = vec![format!("Student {} created.", name)];
    let mut warnings = Vec::new();
    match &outcome.delivery {
        Ok(recipient) => messages.push(sent_message(state.workflow.mail_backend(), recipient)),
        Err(Error::Notify(e)) => warnings.push(format!(
            "The PDF could not be sent. {}",
            e.user_message()
        )),
        Err(e) => warnings.push(format!("The PDF could not be generated: {}", e)),
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "messages": messages,
            "warnings": warnings,
            "student": outcome.student,
        })),
    ))
}

/// GET /edit/:id
async fn get_student(
    State(state): State<StudentsState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let owner = current_owner(&state.accounts, &session).await?;
    let student = state.workflow.get(&owner, record_id(&id)?).await?;
    Ok(Json(serde_json::json!({ "student": student })))
}

/// POST /edit/:id
async fn update_student(
    State(state): State<StudentsState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<StudentForm>,
) -> Result<impl IntoResponse> {
    let owner = current_owner(&state.accounts, &session).await?;
    let student = state.workflow.update(&owner, record_id(&id)?, form).await?;
    Ok(Json(serde_json::json!({
        "messages": ["Student updated successfully."],
        "warnings": [],
        "student": student,
    })))
}

/// POST /delete/:id
async fn delete_student(
    State(state): State<StudentsState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let owner = current_owner(&state.accounts, &session).await?;
    let student = state.workflow.delete(&owner, record_id(&id)?).await?;
    Ok(Json(serde_json::json!({
        "messages": [format!("Student {} deleted.", student.full_name())],
        "warnings": [],
    })))
}

/// POST /send-pdf/:id
async fn send_pdf(
    State(state): State<StudentsState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let owner = current_owner(&state.accounts, &session).await?;
    let recipient = state.workflow.resend(&owner, record_id(&id)?).await?;
    Ok(Json(serde_json::json!({
        "messages": [sent_message(state.workflow.mail_backend(), &recipient)],
        "warnings": [],
    })))
}
