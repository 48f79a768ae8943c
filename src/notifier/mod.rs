//! Outbound mail notifications
//!
//! The [`Notifier`] resolves the sender from [`MailConfig`], enforces the
//! recipient and backend checks, and hands composed messages to a
//! [`MailTransport`]. Every failure comes back as a typed [`NotifyError`] so
//! callers can decide between a warning and an error response.

mod message;
mod transport;

pub use message::{MailAttachment, MailMessage};
#[cfg(test)]
pub(crate) use transport::RecordingTransport;
pub use transport::{
    build_email, classify_smtp_failure, ConsoleTransport, MailTransport, SmtpTransport,
};

use crate::accounts::Account;
use crate::config::{MailBackend, MailConfig};
use crate::error::{NotifyError, Result};
use std::sync::Arc;

/// Whether `value` is a syntactically valid email address
pub fn is_valid_address(value: &str) -> bool {
    value.parse::<lettre::Address>().is_ok()
}

/// Mail sender bound to one backend configuration
pub struct Notifier {
    config: MailConfig,
    transport: Option<Arc<dyn MailTransport>>,
}

impl Notifier {
    /// Build the transport the configuration asks for
    pub fn from_config(config: MailConfig) -> Result<Self> {
        let transport: Option<Arc<dyn MailTransport>> = match config.backend {
            MailBackend::Smtp => Some(Arc::new(SmtpTransport::new(&config.smtp)?)),
            MailBackend::Console => Some(Arc::new(ConsoleTransport)),
            MailBackend::Disabled => None,
        };

        tracing::info!(backend = %config.backend, sender = %config.sender(), "Mail notifier ready");
        Ok(Self { config, transport })
    }

    /// Use an explicit transport (the configured backend still gates sends)
    pub fn with_transport(config: MailConfig, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            config,
            transport: Some(transport),
        }
    }

    pub fn backend(&self) -> MailBackend {
        self.config.backend
    }

    /// Send a plain-text message with an optional attachment
    ///
    /// Checks run in order: recipient present, then backend delivering. Only
    /// then is the transport invoked.
    pub async fn send(
        &self,
        recipient: Option<&str>,
        subject: &str,
        body: &str,
        attachment: Option<MailAttachment>,
    ) -> std::result::Result<(), NotifyError> {
        let to = recipient
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or(NotifyError::NoRecipient)?;

        if self.config.backend == MailBackend::Disabled {
            return Err(NotifyError::BackendUnconfigured(
                "mail backend is disabled".to_string(),
            ));
        }
        let transport = self.transport.as_ref().ok_or_else(|| {
            NotifyError::BackendUnconfigured("no mail transport available".to_string())
        })?;
        let from = self.config.sender();

        let message = MailMessage {
            from: from.to_string(),
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            attachment,
        };

        match transport.deliver(&message).await {
            Ok(()) => {
                tracing::info!(
                    transport = transport.name(),
                    to = %message.to,
                    subject = %message.subject,
                    "Mail sent"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    transport = transport.name(),
                    to = %message.to,
                    code = e.code(),
                    "Mail send failed: {}",
                    e
                );
                Err(e)
            }
        }
    }

    /// Greet a newly registered owner
    pub async fn welcome(&self, account: &Account) -> std::result::Result<(), NotifyError> {
        let body = format!(
            "Hello {},\n\n\
             Welcome to Roster!\n\n\
             Your account has been created. You can now sign in and start managing your students.\n\n\
             Regards,\n\
             The Roster team",
            account.username
        );
        self.send(account.email.as_deref(), "Welcome to Roster", &body, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn mail_config(backend: MailBackend) -> MailConfig {
        MailConfig {
            backend,
            from: Some("school@example.com".to_string()),
            ..Default::default()
        }
    }

    fn recording(backend: MailBackend) -> (Notifier, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let notifier = Notifier::with_transport(mail_config(backend), transport.clone());
        (notifier, transport)
    }

    #[test]
    fn test_is_valid_address() {
        assert!(is_valid_address("ana@x.com"));
        assert!(!is_valid_address("ana"));
        assert!(!is_valid_address("ana@"));
        assert!(!is_valid_address(""));
    }

    #[tokio::test]
    async fn test_send_delivers() {
        let (notifier, transport) = recording(MailBackend::Console);
        let attachment = MailAttachment::pdf("a.pdf", vec![1, 2, 3]);

        notifier
            .send(Some("u@x.com"), "Subject", "Body", Some(attachment.clone()))
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "u@x.com");
        assert_eq!(sent[0].from, "school@example.com");
        assert_eq!(sent[0].attachment, Some(attachment));
    }

    #[tokio::test]
    async fn test_no_recipient() {
        let (notifier, transport) = recording(MailBackend::Console);

        assert_eq!(
            notifier.send(None, "s", "b", None).await,
            Err(NotifyError::NoRecipient)
        );
        assert_eq!(
            notifier.send(Some("   "), "s", "b", None).await,
            Err(NotifyError::NoRecipient)
        );
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_backend() {
        let (notifier, transport) = recording(MailBackend::Disabled);
        assert!(matches!(
            notifier.send(Some("u@x.com"), "s", "b", None).await,
            Err(NotifyError::BackendUnconfigured(_))
        ));
        assert!(transport.sent().is_empty());

        let notifier = Notifier::from_config(mail_config(MailBackend::Disabled)).unwrap();
        assert!(matches!(
            notifier.send(Some("u@x.com"), "s", "b", None).await,
            Err(NotifyError::BackendUnconfigured(_))
        ));
    }

    #[tokio::test]
    async fn test_default_config_delivers() {
        let notifier = Notifier::from_config(MailConfig::default()).unwrap();
        assert_eq!(notifier.backend(), MailBackend::Console);
        notifier.send(Some("u@x.com"), "s", "b", None).await.unwrap();

        let transport = Arc::new(RecordingTransport::default());
        let notifier = Notifier::with_transport(MailConfig::default(), transport.clone());
        notifier.send(Some("u@x.com"), "s", "b", None).await.unwrap();
        assert_eq!(transport.sent()[0].from, "webmaster@localhost");
    }

    #[tokio::test]
    async fn test_transport_failure_is_returned() {
        let transport = Arc::new(RecordingTransport::failing(NotifyError::AuthFailure(
            "535".to_string(),
        )));
        let notifier = Notifier::with_transport(mail_config(MailBackend::Smtp), transport);

        assert!(matches!(
            notifier.send(Some("u@x.com"), "s", "b", None).await,
            Err(NotifyError::AuthFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_welcome_goes_to_account_email() {
        let (notifier, transport) = recording(MailBackend::Console);
        let account = Account {
            username: "profe".to_string(),
            email: Some("profe@example.com".to_string()),
            password_hash: String::new(),
            date_joined: Utc::now(),
        };

        notifier.welcome(&account).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].to, "profe@example.com");
        assert_eq!(sent[0].subject, "Welcome to Roster");
        assert!(sent[0].body.starts_with("Hello profe,"));
    }

    #[tokio::test]
    async fn test_console_backend_from_config() {
        let notifier = Notifier::from_config(mail_config(MailBackend::Console)).unwrap();
        assert_eq!(notifier.backend(), MailBackend::Console);
        notifier.send(Some("u@x.com"), "s", "b", None).await.unwrap();
    }
}
