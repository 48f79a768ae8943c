//! Record workflow: owner-scoped CRUD plus the PDF-and-mail side effect
//!
//! Mutations commit to the store first. Document generation and mail
//! delivery run afterwards and their failures are reported back to the
//! caller without touching the committed record.

use crate::accounts::Account;
use crate::config::MailBackend;
use crate::document;
use crate::error::{Error, Result};
use crate::notifier::{MailAttachment, Notifier};
use crate::students::store::StudentStore;
use crate::students::types::{Student, StudentForm};
use std::sync::Arc;

/// Result of a successful create
#[derive(Debug)]
pub struct CreateOutcome {
    pub student: Student,
    /// Recipient on success; document or mail error otherwise
    pub delivery: Result<String>,
}

/// Which message accompanies the PDF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Occasion {
    Created,
    Resent,
}

/// Orchestrates record operations for the acting owner
pub struct StudentWorkflow {
    store: Arc<StudentStore>,
    notifier: Arc<Notifier>,
}

impl StudentWorkflow {
    pub fn new(store: Arc<StudentStore>, notifier: Arc<Notifier>) -> Self {
        Self { store, notifier }
    }

    pub fn mail_backend(&self) -> MailBackend {
        self.notifier.backend()
    }

    /// Owner's records, newest first
    pub async fn list(&self, owner: &Account) -> Vec<Student> {
        self.store.list(&owner.username).await
    }

    /// A single owned record
    pub async fn get(&self, owner: &Account, id: u64) -> Result<Student> {
        self.store
            .get(&owner.username, id)
            .await
            .ok_or(Error::NotFound)
    }

    /// Validate, persist, then try to mail the summary to the owner
    pub async fn create(&self, owner: &Account, form: StudentForm) -> Result<CreateOutcome> {
        let fields = form.validate()?;
        let student = self.store.insert(&owner.username, fields).await?;

        tracing::info!(
            owner = %owner.username,
            student_id = student.id,
            "Student created"
        );

        let delivery = self.deliver(owner, &student, Occasion::Created).await;
        Ok(CreateOutcome { student, delivery })
    }

    /// Re-validate and overwrite an owned record
    pub async fn update(&self, owner: &Account, id: u64, form: StudentForm) -> Result<Student> {
        // Ownership first so a foreign id never reveals validation details
        self.get(owner, id).await?;
        let fields = form.validate()?;
        let student = self.store.update(&owner.username, id, fields).await?;

        tracing::info!(owner = %owner.username, student_id = id, "Student updated");
        Ok(student)
    }

    /// Permanently remove an owned record
    pub async fn delete(&self, owner: &Account, id: u64) -> Result<Student> {
        let student = self.store.delete(&owner.username, id).await?;
        tracing::info!(owner = %owner.username, student_id = id, "Student deleted");
        Ok(student)
    }

    /// Regenerate the summary and mail it again; returns the recipient
    pub async fn resend(&self, owner: &Account, id: u64) -> Result<String> {
        let student = self.get(owner, id).await?;
        self.deliver(owner, &student, Occasion::Resent).await
    }

    /// The recipient is always the acting owner, never the student
    async fn deliver(&self, owner: &Account, student: &Student, occasion: Occasion) -> Result<String> {
        let pdf = document::render(student)?;
        let attachment = MailAttachment::pdf(document::filename(student), pdf);

        let subject = format!("Student information: {}", student.full_name());
        let body = match occasion {
            Occasion::Created => format!(
                "Hello {},\n\n\
                 A new student has been registered: {}.\n\
                 Attached you will find the student's complete information.\n\n\
                 Regards,\n\
                 Roster",
                owner.username,
                student.full_name()
            ),
            Occasion::Resent => format!(
                "Hello {},\n\n\
                 Attached you will find the information for student {}.\n\n\
                 Regards,\n\
                 Roster",
                owner.username,
                student.full_name()
            ),
        };

        self.notifier
            .send(owner.email.as_deref(), &subject, &body, Some(attachment))
            .await?;

        Ok(owner.email.clone().unwrap_or_default())
    }
}
