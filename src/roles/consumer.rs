// src/roles/consumer.rs

use super::producer::jitter;
use super::StopReason;
use crate::cancel::CancelToken;
use crate::error::QueueError;
use crate::queue::BlockingQueue;
use std::time::Duration;
use tracing::{debug, info};

/// How a consumer reacts to cancellation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DrainPolicy {
    /// Ignore the token and keep consuming until the queue reports `Closed`.
    /// This is the canonical shutdown: producers stop, the queue is closed,
    /// consumers drain what is left.
    #[default]
    Drain,
    /// Stop as soon as the token fires, leaving buffered messages behind.
    Abandon,
}

/// Outcome of a [`Consumer::run`] loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerReport {
    pub consumer_id: u32,
    pub received: u64,
    pub stop: StopReason,
}

/// A loop that dequeues messages and hands them to a handler.
pub struct Consumer<T> {
    queue: BlockingQueue<T>,
    token: CancelToken,
    consumer_id: u32,
    policy: DrainPolicy,
    max_jitter: Option<Duration>,
}

impl<T: Send + 'static> Consumer<T> {
    pub fn new(queue: BlockingQueue<T>, token: CancelToken, consumer_id: u32) -> Self {
        Self {
            queue,
            token,
            consumer_id,
            policy: DrainPolicy::default(),
            max_jitter: None,
        }
    }

    pub fn with_policy(mut self, policy: DrainPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Pause for a random interval in `[0, max_jitter)` after each message.
    pub fn with_pacing(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = Some(max_jitter).filter(|d| !d.is_zero());
        self
    }

    pub fn consumer_id(&self) -> u32 {
        self.consumer_id
    }

    /// Run the loop on the calling thread, passing each message to `handler`.
    pub fn run<F>(self, mut handler: F) -> ConsumerReport
    where
        F: FnMut(T),
    {
        let consumer_id = self.consumer_id;
        let mut received = 0u64;
        debug!(consumer_id, policy = ?self.policy, "consumer started");

        let stop = loop {
            let next = match self.policy {
                DrainPolicy::Drain => self.queue.dequeue(),
                DrainPolicy::Abandon => {
                    if let Some(reason) = self.token.reason() {
                        break StopReason::Cancelled(reason);
                    }
                    self.queue.dequeue_cancellable(&self.token)
                }
            };
            match next {
                Ok(msg) => {
                    handler(msg);
                    received += 1;
                }
                Err(QueueError::Closed) => break StopReason::Closed,
                Err(QueueError::Cancelled(reason)) => break StopReason::Cancelled(reason),
            }
            if let Some(reason) = self.pause() {
                break StopReason::Cancelled(reason);
            }
        };

        info!(consumer_id, received, stop = %stop, "consumer stopped");
        ConsumerReport {
            consumer_id,
            received,
            stop,
        }
    }

    fn pause(&self) -> Option<crate::cancel::CancelReason> {
        let max = self.max_jitter?;
        match self.policy {
            DrainPolicy::Drain => {
                std::thread::sleep(jitter(max));
                None
            }
            DrainPolicy::Abandon => self.token.wait_timeout(jitter(max)),
        }
    }
}
