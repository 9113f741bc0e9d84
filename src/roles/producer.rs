// src/roles/producer.rs

use super::StopReason;
use crate::cancel::CancelToken;
use crate::error::QueueError;
use crate::queue::BlockingQueue;
use std::time::Duration;
use tracing::{debug, info};

/// Outcome of a [`Producer::run`] loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProducerReport {
    pub producer_id: u32,
    pub sent: u64,
    pub stop: StopReason,
}

/// A loop that pulls messages from a source and enqueues them until it is
/// cancelled, the queue closes, or the source runs dry.
///
/// Enqueue waits are cancellable, so a producer blocked on a full queue
/// still observes a late shutdown.
pub struct Producer<T> {
    queue: BlockingQueue<T>,
    token: CancelToken,
    producer_id: u32,
    max_jitter: Option<Duration>,
}

impl<T: Send + 'static> Producer<T> {
    pub fn new(queue: BlockingQueue<T>, token: CancelToken, producer_id: u32) -> Self {
        Self {
            queue,
            token,
            producer_id,
            max_jitter: None,
        }
    }

    /// Pause for a random interval in `[0, max_jitter)` after each message.
    /// The pause ends early if the token fires.
    pub fn with_pacing(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = Some(max_jitter).filter(|d| !d.is_zero());
        self
    }

    pub fn producer_id(&self) -> u32 {
        self.producer_id
    }

    /// Run the loop on the calling thread.
    ///
    /// `source` receives the number of messages sent so far and returns the
    /// next message, or `None` when there is nothing left to send.
    pub fn run<F>(self, mut source: F) -> ProducerReport
    where
        F: FnMut(u64) -> Option<T>,
    {
        let producer_id = self.producer_id;
        let mut sent = 0u64;
        debug!(producer_id, "producer started");

        let stop = loop {
            if let Some(reason) = self.token.reason() {
                break StopReason::Cancelled(reason);
            }
            let Some(msg) = source(sent) else {
                break StopReason::Exhausted;
            };
            match self.queue.enqueue_cancellable(msg, &self.token) {
                Ok(()) => sent += 1,
                Err(QueueError::Closed) => {
                    // Expected during shutdown, not a lost-data condition.
                    debug!(producer_id, "queue closed under producer");
                    break StopReason::Closed;
                }
                Err(QueueError::Cancelled(reason)) => break StopReason::Cancelled(reason),
            }
            if let Some(max) = self.max_jitter {
                if let Some(reason) = self.token.wait_timeout(jitter(max)) {
                    break StopReason::Cancelled(reason);
                }
            }
        };

        info!(producer_id, sent, stop = %stop, "producer stopped");
        ProducerReport {
            producer_id,
            sent,
            stop,
        }
    }
}

pub(crate) fn jitter(max: Duration) -> Duration {
    let max_ns = max.as_nanos().min(u64::MAX as u128) as u64;
    Duration::from_nanos(fastrand::u64(0..max_ns.max(1)))
}
