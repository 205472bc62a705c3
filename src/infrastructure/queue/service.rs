//! Job queue trait, job envelope and error types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The broker could not be reached or did not accept the command.
    #[error("Queue unavailable: {0}")]
    Unavailable(String),
    /// A job envelope or payload could not be encoded or decoded.
    #[error("Invalid job payload: {0}")]
    Payload(String),
}

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// A job envelope as stored by the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub name: String,
    pub payload: Value,
    /// Number of failed deliveries so far.
    pub attempts: u32,
    pub enqueued_at: DateTime<Utc>,
    /// Broker-specific handle of the reserved copy (the raw Redis list element).
    #[serde(skip)]
    pub receipt: Option<String>,
}

impl Job {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            payload,
            attempts: 0,
            enqueued_at: Utc::now(),
            receipt: None,
        }
    }

    /// Deserializes the payload into a typed job body.
    pub fn decode<T: DeserializeOwned>(&self) -> QueueResult<T> {
        serde_json::from_value(self.payload.clone()).map_err(|e| QueueError::Payload(e.to_string()))
    }
}

/// Producer/consumer contract of the notification queue.
///
/// Implementations must be thread-safe. Producers only call [`JobQueue::enqueue`];
/// consumers reserve jobs and settle each one with exactly one of
/// [`JobQueue::ack`], [`JobQueue::retry`] or [`JobQueue::bury`].
///
/// # Implementations
///
/// - [`crate::infrastructure::queue::RedisJobQueue`] - Redis lists and a delayed sorted set
/// - [`crate::infrastructure::queue::MemoryJobQueue`] - In-process, not durable
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Durably accepts a job and returns its ID.
    ///
    /// Returns once the broker has accepted the job, not once it is processed.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Unavailable`] if the broker did not accept the job.
    async fn enqueue(&self, job_name: &str, payload: Value) -> QueueResult<String>;

    /// Reserves the next ready job, waiting up to `timeout`.
    ///
    /// Returns `Ok(None)` when no job became ready in time.
    async fn reserve(&self, timeout: Duration) -> QueueResult<Option<Job>>;

    /// Marks a reserved job as done.
    async fn ack(&self, job: &Job) -> QueueResult<()>;

    /// Releases a reserved job for another delivery after `delay`, counting one attempt.
    async fn retry(&self, job: &Job, delay: Duration) -> QueueResult<()>;

    /// Moves a reserved job to the dead-letter set.
    async fn bury(&self, job: &Job, reason: &str) -> QueueResult<()>;

    /// Returns jobs left reserved by a crashed consumer to the ready set.
    ///
    /// Returns the number of redelivered jobs.
    async fn recover(&self) -> QueueResult<usize>;

    /// Checks if the broker is reachable.
    async fn health_check(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Body {
        value: u32,
    }

    #[test]
    fn test_new_job_has_unique_id_and_no_attempts() {
        let a = Job::new("WelcomeMail", json!({}));
        let b = Job::new("WelcomeMail", json!({}));

        assert_ne!(a.id, b.id);
        assert_eq!(a.attempts, 0);
        assert!(a.receipt.is_none());
    }

    #[test]
    fn test_decode_payload() {
        let job = Job::new("Test", json!({ "value": 7 }));
        assert_eq!(job.decode::<Body>().unwrap(), Body { value: 7 });

        let bad = Job::new("Test", json!({ "other": true }));
        assert!(matches!(bad.decode::<Body>(), Err(QueueError::Payload(_))));
    }

    #[test]
    fn test_receipt_is_not_serialized() {
        let mut job = Job::new("Test", json!({}));
        job.receipt = Some("raw".to_string());

        let text = serde_json::to_string(&job).unwrap();
        assert!(!text.contains("receipt"));

        let parsed: Job = serde_json::from_str(&text).unwrap();
        assert!(parsed.receipt.is_none());
        assert_eq!(parsed.id, job.id);
    }
}
