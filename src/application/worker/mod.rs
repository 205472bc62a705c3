//! Background consumer of the notification job queue.
//!
//! - [`NotificationWorker`] - reserve / dispatch / settle loop
//! - [`JobHandler`] - per-job-name handler contract
//! - [`welcome_mail::WelcomeMailHandler`] - renders and sends welcome mails

pub mod welcome_mail;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::infrastructure::mail::MailError;
use crate::infrastructure::queue::{Job, JobQueue};

pub use welcome_mail::WelcomeMailHandler;

/// Failure of a single job execution.
#[derive(Debug, Error)]
pub enum JobError {
    /// The payload cannot be decoded; retrying will not help.
    #[error("Invalid payload: {0}")]
    Payload(String),
    #[error("Failed to render message: {0}")]
    Render(String),
    #[error(transparent)]
    Mail(#[from] MailError),
}

impl JobError {
    /// Whether a later attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, JobError::Payload(_))
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &Job) -> Result<(), JobError>;
}

/// Retry and polling policy of the worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Deliveries after which a failing job is buried.
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    /// How long a single reserve call waits for a job.
    pub poll_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base: Duration::from_millis(1000),
            backoff_max: Duration::from_millis(60_000),
            poll_timeout: Duration::from_secs(5),
        }
    }
}

impl WorkerConfig {
    /// Delay before redelivery after the `attempt`-th failed delivery (1-based):
    /// `base * 2^(attempt - 1)`, capped at `backoff_max`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.backoff_base
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.backoff_max)
            .min(self.backoff_max)
    }
}

/// Drains the job queue and dispatches jobs to handlers by name.
///
/// Delivery is at-least-once: a job is acknowledged only after its handler
/// succeeded, failures are retried with exponential backoff and jobs that keep
/// failing (or have no handler) are buried in the dead list, never dropped.
pub struct NotificationWorker {
    queue: Arc<dyn JobQueue>,
    handlers: HashMap<String, Arc<dyn JobHandler>>,
    config: WorkerConfig,
}

impl NotificationWorker {
    pub fn new(queue: Arc<dyn JobQueue>, config: WorkerConfig) -> Self {
        Self {
            queue,
            handlers: HashMap::new(),
            config,
        }
    }

    /// Registers the handler for jobs named `job_name`.
    pub fn register(mut self, job_name: impl Into<String>, handler: Arc<dyn JobHandler>) -> Self {
        self.handlers.insert(job_name.into(), handler);
        self
    }

    /// Runs until `shutdown` turns `true` or its sender is dropped.
    ///
    /// Jobs left reserved by a previous run are redelivered first. Recovery
    /// covers the whole processing list, so with several workers on one queue
    /// a restart can redeliver jobs a live peer is still handling.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        match self.queue.recover().await {
            Ok(0) => {}
            Ok(recovered) => info!(recovered, "Requeued unsettled jobs"),
            Err(e) => warn!(error = %e, "Failed to requeue unsettled jobs"),
        }

        info!(handlers = self.handlers.len(), "Notification worker started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let reserved = tokio::select! {
                _ = shutdown.changed() => break,
                reserved = self.queue.reserve(self.config.poll_timeout) => reserved,
            };

            match reserved {
                Ok(Some(job)) => self.process(job).await,
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "Queue unavailable, pausing worker");
                    tokio::select! {
                        _ = shutdown.changed() => break,
                        _ = tokio::time::sleep(self.config.backoff_base) => {}
                    }
                }
            }
        }

        info!("Notification worker stopped");
    }

    /// Executes one reserved job and settles it.
    pub async fn process(&self, job: Job) {
        let attempt = job.attempts + 1;

        let Some(handler) = self.handlers.get(&job.name) else {
            warn!(job_id = %job.id, job_name = %job.name, "No handler registered for job");
            self.bury(&job, "no handler registered").await;
            return;
        };

        debug!(job_id = %job.id, job_name = %job.name, attempt, "Processing job");

        match handler.handle(&job).await {
            Ok(()) => {
                if let Err(e) = self.queue.ack(&job).await {
                    // The job stays reserved and is redelivered after recovery.
                    error!(job_id = %job.id, error = %e, "Failed to acknowledge job");
                    return;
                }
                metrics::counter!("notification_jobs_processed_total").increment(1);
                info!(job_id = %job.id, job_name = %job.name, attempt, "Job completed");
            }
            Err(e) => {
                metrics::counter!("notification_jobs_failed_total").increment(1);

                if !e.is_retryable() || attempt >= self.config.max_attempts {
                    error!(job_id = %job.id, job_name = %job.name, attempt, error = %e, "Job failed permanently");
                    self.bury(&job, &e.to_string()).await;
                    return;
                }

                let delay = self.config.backoff(attempt);
                warn!(
                    job_id = %job.id,
                    job_name = %job.name,
                    attempt,
                    retry_in_ms = delay.as_millis() as u64,
                    error = %e,
                    "Job failed, scheduling retry"
                );

                if let Err(e) = self.queue.retry(&job, delay).await {
                    error!(job_id = %job.id, error = %e, "Failed to schedule retry");
                }
            }
        }
    }

    async fn bury(&self, job: &Job, reason: &str) {
        match self.queue.bury(job, reason).await {
            Ok(()) => metrics::counter!("notification_jobs_dead_total").increment(1),
            Err(e) => error!(job_id = %job.id, error = %e, "Failed to bury job"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::queue::{MemoryJobQueue, QueueSnapshot};
    use serde_json::json;

    const SHORT: Duration = Duration::from_millis(20);

    fn config(max_attempts: u32) -> WorkerConfig {
        WorkerConfig {
            max_attempts,
            backoff_base: Duration::from_millis(1),
            backoff_max: Duration::from_millis(5),
            poll_timeout: SHORT,
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = WorkerConfig {
            backoff_base: Duration::from_millis(1000),
            backoff_max: Duration::from_millis(60_000),
            ..Default::default()
        };

        assert_eq!(config.backoff(1), Duration::from_millis(1000));
        assert_eq!(config.backoff(2), Duration::from_millis(2000));
        assert_eq!(config.backoff(4), Duration::from_millis(8000));
        assert_eq!(config.backoff(7), Duration::from_millis(60_000));
        assert_eq!(config.backoff(64), Duration::from_millis(60_000));
    }

    #[tokio::test]
    async fn test_successful_job_is_acknowledged() {
        let queue = Arc::new(MemoryJobQueue::new());
        queue.enqueue("WelcomeMail", json!({})).await.unwrap();

        let mut handler = MockJobHandler::new();
        handler.expect_handle().times(1).returning(|_| Ok(()));

        let worker =
            NotificationWorker::new(queue.clone(), config(3)).register("WelcomeMail", Arc::new(handler));

        let job = queue.reserve(SHORT).await.unwrap().unwrap();
        worker.process(job).await;

        assert_eq!(queue.snapshot().await, QueueSnapshot::default());
    }

    #[tokio::test]
    async fn test_failed_job_is_retried_then_buried() {
        let queue = Arc::new(MemoryJobQueue::new());
        queue.enqueue("WelcomeMail", json!({})).await.unwrap();

        let mut handler = MockJobHandler::new();
        handler
            .expect_handle()
            .times(2)
            .returning(|_| Err(JobError::Mail(MailError::Transport("refused".to_string()))));

        let worker =
            NotificationWorker::new(queue.clone(), config(2)).register("WelcomeMail", Arc::new(handler));

        let job = queue.reserve(SHORT).await.unwrap().unwrap();
        worker.process(job).await;
        assert_eq!(queue.snapshot().await.delayed, 1);

        let job = queue
            .reserve(Duration::from_millis(200))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(job.attempts, 1);
        worker.process(job).await;

        let snapshot = queue.snapshot().await;
        assert_eq!(snapshot.dead, 1);
        assert_eq!(snapshot.pending + snapshot.delayed + snapshot.processing, 0);
    }

    #[tokio::test]
    async fn test_unknown_job_is_buried() {
        let queue = Arc::new(MemoryJobQueue::new());
        queue.enqueue("Mystery", json!({})).await.unwrap();

        let worker = NotificationWorker::new(queue.clone(), config(3));
        let job = queue.reserve(SHORT).await.unwrap().unwrap();
        worker.process(job).await;

        let dead = queue.dead_jobs().await;
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].1, "no handler registered");
    }

    #[tokio::test]
    async fn test_bad_payload_is_buried_without_retry() {
        let queue = Arc::new(MemoryJobQueue::new());
        queue.enqueue("WelcomeMail", json!("garbage")).await.unwrap();

        let mut handler = MockJobHandler::new();
        handler
            .expect_handle()
            .times(1)
            .returning(|_| Err(JobError::Payload("expected object".to_string())));

        let worker =
            NotificationWorker::new(queue.clone(), config(5)).register("WelcomeMail", Arc::new(handler));

        let job = queue.reserve(SHORT).await.unwrap().unwrap();
        worker.process(job).await;

        assert_eq!(queue.snapshot().await.dead, 1);
    }

    #[tokio::test]
    async fn test_run_drains_queue_and_stops_on_shutdown() {
        let queue = Arc::new(MemoryJobQueue::new());
        queue.enqueue("WelcomeMail", json!({ "n": 1 })).await.unwrap();
        queue.enqueue("WelcomeMail", json!({ "n": 2 })).await.unwrap();

        let mut handler = MockJobHandler::new();
        handler.expect_handle().times(2).returning(|_| Ok(()));

        let worker =
            NotificationWorker::new(queue.clone(), config(3)).register("WelcomeMail", Arc::new(handler));

        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(worker.run(rx));

        for _ in 0..50 {
            if queue.snapshot().await == QueueSnapshot::default() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(queue.snapshot().await, QueueSnapshot::default());
    }
}
