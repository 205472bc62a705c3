//! Durable job queue between the enrollment workflow and the notification worker.
//!
//! Provides a [`JobQueue`] trait with two implementations:
//! - [`RedisJobQueue`] - Production Redis-backed reliable queue
//! - [`MemoryJobQueue`] - In-process queue for tests and Redis-less development
//!
//! Delivery is at-least-once: a reserved job stays in a processing set until it
//! is acknowledged, retried or buried, and leftovers are redelivered on recovery.

mod memory_queue;
mod redis_queue;
mod service;

pub use memory_queue::{MemoryJobQueue, QueueSnapshot};
pub use redis_queue::RedisJobQueue;
pub use service::{Job, JobQueue, QueueError, QueueResult};

#[cfg(test)]
pub use service::MockJobQueue;
