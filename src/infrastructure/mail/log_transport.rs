//! Mail transport that only logs.

use super::service::{MailError, MailMessage, MailTransport};
use async_trait::async_trait;
use tracing::info;

/// Writes messages to the log instead of delivering them.
///
/// Used when no mail API is configured.
#[derive(Debug, Default)]
pub struct LogMailTransport;

impl LogMailTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MailTransport for LogMailTransport {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body_len = message.body.len(),
            "Mail not sent (log transport)"
        );
        Ok(())
    }
}
