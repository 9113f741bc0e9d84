//! Error types
//!
//! `Closed` and `Cancelled` are the designed termination signals of the
//! queue, not defects. Callers stop their loop on them; the queue never
//! retries or logs on their behalf.

use crate::cancel::CancelReason;
use thiserror::Error;

/// Failure of a blocking queue operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The queue is closed (and, for dequeue, fully drained).
    #[error("queue is closed")]
    Closed,

    /// A cancellation signal was observed while waiting.
    #[error("wait cancelled: {0}")]
    Cancelled(CancelReason),
}

impl QueueError {
    pub fn is_closed(&self) -> bool {
        matches!(self, QueueError::Closed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, QueueError::Cancelled(_))
    }
}

/// Failure of [`BlockingQueue::try_enqueue`](crate::BlockingQueue::try_enqueue).
/// The rejected message is handed back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TryEnqueueError<T> {
    #[error("queue is full")]
    Full(T),

    #[error("queue is closed")]
    Closed(T),
}

impl<T> TryEnqueueError<T> {
    /// Recover the message that was not enqueued.
    pub fn into_inner(self) -> T {
        match self {
            TryEnqueueError::Full(msg) | TryEnqueueError::Closed(msg) => msg,
        }
    }
}

/// Failure of [`BlockingQueue::try_dequeue`](crate::BlockingQueue::try_dequeue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryDequeueError {
    #[error("queue is empty")]
    Empty,

    #[error("queue is closed")]
    Closed,
}

/// Invalid construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("queue capacity must be at least 1")]
    ZeroCapacity,

    #[error("at least one {role} is required")]
    NoWorkers { role: &'static str },
}

/// Failure while running or shutting down a [`Supervisor`](crate::Supervisor).
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to spawn role thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("{role} thread panicked")]
    RolePanicked { role: String },
}
