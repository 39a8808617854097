//! Outbound mail for workflow email actions.
//!
//! The engine only sees the [`MailTransport`] trait. [`SmtpMailer`] delivers
//! through `lettre`; [`LogMailer`] records the message in the log and is used
//! when SMTP is not configured.

pub mod email;
pub mod transport;

pub use email::{EmailConfig, EmailError, SmtpMailer};
pub use transport::{mailer_from_env, LogMailer, MailTransport, OutgoingEmail};
