//! In-process job queue for tests and development without Redis.

use super::service::{Job, JobQueue, QueueError, QueueResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Default)]
struct State {
    pending: VecDeque<Job>,
    processing: HashMap<String, Job>,
    delayed: Vec<(Instant, Job)>,
    dead: Vec<(Job, String)>,
}

impl State {
    fn promote_due(&mut self, now: Instant) {
        let mut i = 0;
        while i < self.delayed.len() {
            if self.delayed[i].0 <= now {
                let (_, job) = self.delayed.swap_remove(i);
                self.pending.push_back(job);
            } else {
                i += 1;
            }
        }
    }
}

/// Counts of jobs per queue section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub pending: usize,
    pub processing: usize,
    pub delayed: usize,
    pub dead: usize,
}

/// A queue kept in process memory.
///
/// Same settle semantics as [`super::RedisJobQueue`], but jobs do not survive a
/// restart. Availability can be toggled to simulate a broker outage.
pub struct MemoryJobQueue {
    state: Mutex<State>,
    notify: Notify,
    available: AtomicBool,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        debug!("Using in-memory job queue (not durable)");
        Self {
            state: Mutex::new(State::default()),
            notify: Notify::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Makes every subsequent operation fail with [`QueueError::Unavailable`] (or succeed again).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub async fn snapshot(&self) -> QueueSnapshot {
        let state = self.state.lock().await;
        QueueSnapshot {
            pending: state.pending.len(),
            processing: state.processing.len(),
            delayed: state.delayed.len(),
            dead: state.dead.len(),
        }
    }

    /// Jobs ready for delivery, oldest first.
    pub async fn pending_jobs(&self) -> Vec<Job> {
        self.state.lock().await.pending.iter().cloned().collect()
    }

    /// Buried jobs together with the reason they were buried.
    pub async fn dead_jobs(&self) -> Vec<(Job, String)> {
        self.state.lock().await.dead.clone()
    }

    fn ensure_available(&self) -> QueueResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(QueueError::Unavailable("in-memory queue disabled".to_string()))
        }
    }
}

impl Default for MemoryJobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(&self, job_name: &str, payload: Value) -> QueueResult<String> {
        self.ensure_available()?;

        let job = Job::new(job_name, payload);
        let id = job.id.clone();
        self.state.lock().await.pending.push_back(job);
        self.notify.notify_one();

        debug!(job_id = %id, job_name, "Job enqueued in memory");
        Ok(id)
    }

    async fn reserve(&self, timeout: Duration) -> QueueResult<Option<Job>> {
        let deadline = Instant::now() + timeout;

        loop {
            self.ensure_available()?;

            let next_delayed = {
                let mut state = self.state.lock().await;
                state.promote_due(Instant::now());

                if let Some(job) = state.pending.pop_front() {
                    state.processing.insert(job.id.clone(), job.clone());
                    return Ok(Some(job));
                }

                state.delayed.iter().map(|(at, _)| *at).min()
            };

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }

            let wake_at = next_delayed.map_or(deadline, |at| at.min(deadline));
            let _ = tokio::time::timeout_at(wake_at, self.notify.notified()).await;
        }
    }

    async fn ack(&self, job: &Job) -> QueueResult<()> {
        self.ensure_available()?;
        self.state.lock().await.processing.remove(&job.id);
        Ok(())
    }

    async fn retry(&self, job: &Job, delay: Duration) -> QueueResult<()> {
        self.ensure_available()?;

        let mut state = self.state.lock().await;
        state.processing.remove(&job.id);

        let mut next = job.clone();
        next.attempts += 1;
        state.delayed.push((Instant::now() + delay, next));
        drop(state);

        self.notify.notify_one();
        Ok(())
    }

    async fn bury(&self, job: &Job, reason: &str) -> QueueResult<()> {
        self.ensure_available()?;

        let mut state = self.state.lock().await;
        state.processing.remove(&job.id);
        state.dead.push((job.clone(), reason.to_string()));

        warn!(job_id = %job.id, job_name = %job.name, reason, "Job buried");
        Ok(())
    }

    async fn recover(&self) -> QueueResult<usize> {
        self.ensure_available()?;

        let mut state = self.state.lock().await;
        let leftovers: Vec<Job> = state.processing.drain().map(|(_, job)| job).collect();
        let count = leftovers.len();
        for job in leftovers {
            state.pending.push_front(job);
        }
        drop(state);

        if count > 0 {
            self.notify.notify_one();
        }
        Ok(count)
    }

    async fn health_check(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
