//! Redis-backed reliable job queue.
//!
//! Key layout for a queue named `gym`:
//!
//! - `gym:pending`    - list of ready job envelopes (LPUSH in, LMOVE out)
//! - `gym:processing` - list of reserved envelopes awaiting ack
//! - `gym:delayed`    - sorted set of envelopes scored by ready time (ms)
//! - `gym:dead`       - list of buried envelopes

use super::service::{Job, JobQueue, QueueError, QueueResult};
use async_trait::async_trait;
use chrono::Utc;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, warn};

/// Interval between polls of the pending list while reserving.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Upper bound for a single broker round-trip during enqueue.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

/// Maximum delayed jobs promoted per reserve call.
const PROMOTE_BATCH: isize = 100;

/// Reliable queue on top of Redis lists.
///
/// Uses connection pooling via `ConnectionManager`. The adapter is not
/// fail-open: every broker error is surfaced as [`QueueError::Unavailable`]
/// and jobs are never dropped silently.
pub struct RedisJobQueue {
    conn: ConnectionManager,
    pending_key: String,
    processing_key: String,
    delayed_key: String,
    dead_key: String,
}

impl RedisJobQueue {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Unavailable`] if the URL is invalid, the connection
    /// cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str, queue_name: &str) -> QueueResult<Self> {
        info!(queue = queue_name, "Connecting job queue to Redis");

        let client = Client::open(redis_url)
            .map_err(|e| QueueError::Unavailable(format!("Failed to create Redis client: {e}")))?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| QueueError::Unavailable(format!("Failed to connect to Redis: {e}")))?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| QueueError::Unavailable(format!("Redis PING failed: {e}")))?;

        info!("✓ Job queue connected to Redis");

        Ok(Self {
            conn: manager,
            pending_key: format!("{queue_name}:pending"),
            processing_key: format!("{queue_name}:processing"),
            delayed_key: format!("{queue_name}:delayed"),
            dead_key: format!("{queue_name}:dead"),
        })
    }

    fn encode(job: &Job) -> QueueResult<String> {
        serde_json::to_string(job).map_err(|e| QueueError::Payload(e.to_string()))
    }

    /// Raw element of a reserved job inside the processing list.
    fn receipt(job: &Job) -> QueueResult<String> {
        match &job.receipt {
            Some(raw) => Ok(raw.clone()),
            None => Self::encode(job),
        }
    }

    /// Moves delayed jobs whose ready time has passed back to the pending list.
    ///
    /// Two consumers promoting the same member may push it twice; duplicates are
    /// acceptable under at-least-once delivery, losses are not.
    async fn promote_due(&self) -> QueueResult<()> {
        let mut conn = self.conn.clone();
        let now_ms = Utc::now().timestamp_millis();

        let due: Vec<String> = redis::cmd("ZRANGEBYSCORE")
            .arg(&self.delayed_key)
            .arg("-inf")
            .arg(now_ms)
            .arg("LIMIT")
            .arg(0)
            .arg(PROMOTE_BATCH)
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        for raw in due {
            let _: () = redis::pipe()
                .atomic()
                .cmd("ZREM")
                .arg(&self.delayed_key)
                .arg(&raw)
                .ignore()
                .cmd("LPUSH")
                .arg(&self.pending_key)
                .arg(&raw)
                .ignore()
                .query_async(&mut conn)
                .await
                .map_err(unavailable)?;
            debug!("Promoted delayed job");
        }

        Ok(())
    }

    async fn try_move_one(&self) -> QueueResult<Option<String>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("LMOVE")
            .arg(&self.pending_key)
            .arg(&self.processing_key)
            .arg("RIGHT")
            .arg("LEFT")
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(raw)
    }
}

fn unavailable(e: redis::RedisError) -> QueueError {
    QueueError::Unavailable(e.to_string())
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, job_name: &str, payload: Value) -> QueueResult<String> {
        let job = Job::new(job_name, payload);
        let raw = Self::encode(&job)?;

        let strategy = ExponentialBackoff::from_millis(50)
            .max_delay(Duration::from_millis(500))
            .map(jitter)
            .take(3);

        let result = Retry::spawn(strategy, || {
            let mut conn = self.conn.clone();
            let key = self.pending_key.clone();
            let raw = raw.clone();
            async move {
                match tokio::time::timeout(COMMAND_TIMEOUT, conn.lpush::<_, _, i64>(key, raw)).await
                {
                    Ok(Ok(_)) => Ok(()),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err("timed out waiting for Redis".to_string()),
                }
            }
        })
        .await;

        match result {
            Ok(()) => {
                debug!(job_id = %job.id, job_name, "Job enqueued");
                Ok(job.id)
            }
            Err(e) => {
                warn!(job_name, error = %e, "Redis did not accept job");
                Err(QueueError::Unavailable(e))
            }
        }
    }

    async fn reserve(&self, timeout: Duration) -> QueueResult<Option<Job>> {
        let deadline = Instant::now() + timeout;

        loop {
            self.promote_due().await?;

            if let Some(raw) = self.try_move_one().await? {
                return match serde_json::from_str::<Job>(&raw) {
                    Ok(mut job) => {
                        job.receipt = Some(raw);
                        Ok(Some(job))
                    }
                    Err(e) => {
                        warn!(error = %e, "Unreadable job envelope moved to dead list");
                        let mut conn = self.conn.clone();
                        let _: () = redis::pipe()
                            .atomic()
                            .cmd("LREM")
                            .arg(&self.processing_key)
                            .arg(1)
                            .arg(&raw)
                            .ignore()
                            .cmd("LPUSH")
                            .arg(&self.dead_key)
                            .arg(&raw)
                            .ignore()
                            .query_async(&mut conn)
                            .await
                            .map_err(unavailable)?;
                        Ok(None)
                    }
                };
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    async fn ack(&self, job: &Job) -> QueueResult<()> {
        let raw = Self::receipt(job)?;
        let mut conn = self.conn.clone();

        conn.lrem::<_, _, i64>(&self.processing_key, 1, raw)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn retry(&self, job: &Job, delay: Duration) -> QueueResult<()> {
        let raw = Self::receipt(job)?;

        let mut next = job.clone();
        next.attempts += 1;
        next.receipt = None;
        let next_raw = Self::encode(&next)?;

        let ready_at_ms = Utc::now().timestamp_millis() + delay.as_millis() as i64;

        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .cmd("LREM")
            .arg(&self.processing_key)
            .arg(1)
            .arg(&raw)
            .ignore()
            .cmd("ZADD")
            .arg(&self.delayed_key)
            .arg(ready_at_ms)
            .arg(&next_raw)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        Ok(())
    }

    async fn bury(&self, job: &Job, reason: &str) -> QueueResult<()> {
        let raw = Self::receipt(job)?;
        let mut conn = self.conn.clone();

        let _: () = redis::pipe()
            .atomic()
            .cmd("LREM")
            .arg(&self.processing_key)
            .arg(1)
            .arg(&raw)
            .ignore()
            .cmd("LPUSH")
            .arg(&self.dead_key)
            .arg(&raw)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        warn!(job_id = %job.id, job_name = %job.name, reason, "Job moved to dead list");
        Ok(())
    }

    async fn recover(&self) -> QueueResult<usize> {
        let mut conn = self.conn.clone();
        let mut recovered = 0;

        loop {
            let moved: Option<String> = redis::cmd("LMOVE")
                .arg(&self.processing_key)
                .arg(&self.pending_key)
                .arg("RIGHT")
                .arg("RIGHT")
                .query_async(&mut conn)
                .await
                .map_err(unavailable)?;

            if moved.is_none() {
                break;
            }
            recovered += 1;
        }

        if recovered > 0 {
            info!(recovered, "Redelivering jobs left in processing");
        }
        Ok(recovered)
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.conn.clone();
        conn.ping::<()>().await.is_ok()
    }
}
