//! Mail transport seam and the log-only implementation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::email::{EmailConfig, EmailError, SmtpMailer};

/// A fully rendered message ready for delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: Option<String>,
    /// Overrides the transport's configured sender.
    pub from: Option<String>,
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
}

impl OutgoingEmail {
    pub fn has_recipient(&self) -> bool {
        self.to.is_some() || !self.cc.is_empty() || !self.bcc.is_empty()
    }
}

/// Delivers [`OutgoingEmail`]s.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError>;
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl MailTransport for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        if !email.has_recipient() {
            return Err(EmailError::Build("message has no recipients".to_string()));
        }
        tracing::info!(
            to = email.to.as_deref().unwrap_or(""),
            cc = email.cc.len(),
            bcc = email.bcc.len(),
            subject = %email.subject,
            "SMTP not configured, email logged instead of sent",
        );
        Ok(())
    }
}

/// Build the transport selected by the environment: SMTP when `SMTP_HOST`
/// is set, otherwise [`LogMailer`].
pub fn mailer_from_env() -> Result<Arc<dyn MailTransport>, EmailError> {
    match EmailConfig::from_env() {
        Some(config) => {
            tracing::info!(host = %config.smtp_host, port = config.smtp_port, "SMTP mail transport enabled");
            Ok(Arc::new(SmtpMailer::new(config)?))
        }
        None => {
            tracing::warn!("SMTP_HOST not set, workflow emails will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}
