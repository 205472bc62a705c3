//! Mail transport trait and message type.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail transport failed: {0}")]
    Transport(String),
    #[error("Mail rejected by provider (status {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// A fully rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MailMessage {
    /// Recipient in `Name <address>` form.
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers rendered messages.
///
/// Success or failure is reported to the caller (the job handler), which decides
/// whether the job is retried.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}
