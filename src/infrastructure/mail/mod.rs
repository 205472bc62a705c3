//! Outbound mail transport used by the notification worker.
//!
//! - [`HttpMailTransport`] - Sends through an HTTP mail API
//! - [`LogMailTransport`] - Logs messages instead of sending them

mod http_transport;
mod log_transport;
mod service;

pub use http_transport::HttpMailTransport;
pub use log_transport::LogMailTransport;
pub use service::{MailError, MailMessage, MailTransport};

#[cfg(test)]
pub use service::MockMailTransport;
