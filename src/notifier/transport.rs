//! Mail transports
//!
//! A [`MailTransport`] moves a fully addressed [`MailMessage`] out of the
//! process. The SMTP transport talks to a relay through lettre; the console
//! transport only logs, which is what development setups use.

use super::message::MailMessage;
use crate::config::SmtpConfig;
use crate::error::{Error, NotifyError, Result};
use async_trait::async_trait;
use lettre::message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Delivers composed messages
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Transport name for logging
    fn name(&self) -> &str;

    /// Hand the message to the underlying channel
    async fn deliver(&self, message: &MailMessage) -> std::result::Result<(), NotifyError>;
}

// =============================================================================
// SMTP
// =============================================================================

/// STARTTLS relay transport
pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    /// Build a relay transport from configuration
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| Error::Config(format!("Invalid SMTP relay '{}': {}", config.host, e)))?
            .port(config.port);

        match (&config.username, &config.password) {
            (Some(user), Some(password)) => {
                builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
            }
            (Some(user), None) => {
                tracing::warn!(user = %user, "SMTP username set without a password; sending unauthenticated");
            }
            _ => {}
        }

        Ok(Self {
            mailer: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn deliver(&self, message: &MailMessage) -> std::result::Result<(), NotifyError> {
        let email = build_email(message)?;
        self.mailer.send(email).await.map(|_| ()).map_err(|e| {
            let code = e.status().map(|c| c.to_string());
            classify_smtp_failure(code.as_deref(), &e.to_string())
        })
    }
}

/// Map an SMTP failure onto the notifier taxonomy
///
/// 530 (authentication required) and 535 (credentials rejected) are
/// authentication failures; everything else is a delivery failure.
pub fn classify_smtp_failure(code: Option<&str>, message: &str) -> NotifyError {
    let auth_code = matches!(code, Some("530") | Some("535"));
    let lower = message.to_lowercase();
    if auth_code
        || message.contains("530")
        || message.contains("535")
        || lower.contains("authentication")
    {
        NotifyError::AuthFailure(message.to_string())
    } else {
        NotifyError::DeliveryFailure(message.to_string())
    }
}

/// Compose a lettre message, attaching the file as a second MIME part
pub fn build_email(message: &MailMessage) -> std::result::Result<Message, NotifyError> {
    let from: Mailbox = message.from.parse().map_err(|e| {
        NotifyError::BackendUnconfigured(format!("invalid sender address '{}': {}", message.from, e))
    })?;
    let to: Mailbox = message.to.parse().map_err(|e| {
        NotifyError::DeliveryFailure(format!("invalid recipient address '{}': {}", message.to, e))
    })?;

    let builder = Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject.clone());

    let built = match &message.attachment {
        Some(attachment) => {
            let content_type = ContentType::parse(&attachment.content_type)
                .map_err(|e| NotifyError::DeliveryFailure(e.to_string()))?;
            builder.multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(message.body.clone()))
                    .singlepart(
                        Attachment::new(attachment.filename.clone())
                            .body(attachment.data.clone(), content_type),
                    ),
            )
        }
        None => builder.body(message.body.clone()),
    };

    built.map_err(|e| NotifyError::DeliveryFailure(e.to_string()))
}

// =============================================================================
// Console
// =============================================================================

/// Logs messages instead of delivering them
pub struct ConsoleTransport;

#[async_trait]
impl MailTransport for ConsoleTransport {
    fn name(&self) -> &str {
        "console"
    }

    async fn deliver(&self, message: &MailMessage) -> std::result::Result<(), NotifyError> {
        tracing::info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            attachment = message.attachment.as_ref().map(|a| a.filename.as_str()),
            attachment_bytes = message.attachment.as_ref().map(|a| a.data.len()),
            "Console mail:\n{}",
            message.body
        );
        Ok(())
    }
}

// =============================================================================
// Recording (tests)
// =============================================================================

/// Captures messages; optionally fails every delivery with a fixed error
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingTransport {
    sent: std::sync::Mutex<Vec<MailMessage>>,
    fail_with: Option<NotifyError>,
}

#[cfg(test)]
impl RecordingTransport {
    pub(crate) fn failing(error: NotifyError) -> Self {
        Self {
            sent: std::sync::Mutex::new(Vec::new()),
            fail_with: Some(error),
        }
    }

    pub(crate) fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl MailTransport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    async fn deliver(&self, message: &MailMessage) -> std::result::Result<(), NotifyError> {
        self.sent.lock().unwrap().push(message.clone());
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::MailAttachment;

    fn message(attachment: Option<MailAttachment>) -> MailMessage {
        MailMessage {
            from: "school@example.com".to_string(),
            to: "u@x.com".to_string(),
            subject: "Student information: Ana Gomez".to_string(),
            body: "Hello".to_string(),
            attachment,
        }
    }

    #[test]
    fn test_classify_auth_codes() {
        assert!(matches!(
            classify_smtp_failure(Some("535"), "permanent error (535): 5.7.8 Username and Password not accepted"),
            NotifyError::AuthFailure(_)
        ));
        assert!(matches!(
            classify_smtp_failure(None, "530 5.7.0 Authentication Required"),
            NotifyError::AuthFailure(_)
        ));
        assert!(matches!(
            classify_smtp_failure(None, "Authentication failed"),
            NotifyError::AuthFailure(_)
        ));
    }

    #[test]
    fn test_classify_other_failures() {
        assert!(matches!(
            classify_smtp_failure(Some("550"), "mailbox unavailable"),
            NotifyError::DeliveryFailure(_)
        ));
        assert!(matches!(
            classify_smtp_failure(None, "Connection refused"),
            NotifyError::DeliveryFailure(_)
        ));
    }

    #[test]
    fn test_build_plain_email() {
        let email = build_email(&message(None)).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("To: u@x.com"));
        assert!(raw.contains("Subject: Student information: Ana Gomez"));
        assert!(!raw.contains("multipart/mixed"));
    }

    #[test]
    fn test_build_email_with_attachment() {
        let attachment = MailAttachment::pdf("student_1_Ana_Gomez.pdf", b"%PDF-1.3".to_vec());
        let email = build_email(&message(Some(attachment))).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("application/pdf"));
        assert!(raw.contains("student_1_Ana_Gomez.pdf"));
    }

    #[test]
    fn test_build_email_bad_addresses() {
        let mut bad_from = message(None);
        bad_from.from = "nope".to_string();
        assert!(matches!(
            build_email(&bad_from),
            Err(NotifyError::BackendUnconfigured(_))
        ));

        let mut bad_to = message(None);
        bad_to.to = "nope".to_string();
        assert!(matches!(
            build_email(&bad_to),
            Err(NotifyError::DeliveryFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_smtp_transport_builds_from_config() {
        let config = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 2525,
            username: Some("teacher@example.com".to_string()),
            password: Some("app-password".to_string()),
        };
        let transport = SmtpTransport::new(&config).unwrap();
        assert_eq!(transport.name(), "smtp");
    }

    #[tokio::test]
    async fn test_console_transport_accepts() {
        ConsoleTransport.deliver(&message(None)).await.unwrap();
    }
}
