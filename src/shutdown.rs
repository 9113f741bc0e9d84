//! Shutdown coordination for a group of producers and consumers sharing one
//! queue.
//!
//! The sequence on shutdown is fixed:
//! 1. the token fires (deadline or explicit trigger) and producers stop,
//! 2. producer threads are joined,
//! 3. the queue is closed exactly once,
//! 4. consumers drain the remaining messages and are joined.

use crate::cancel::{CancelReason, CancelToken};
use crate::error::{ConfigError, SupervisorError};
use crate::queue::{BlockingQueue, QueueBuilder};
use crate::roles::{Consumer, ConsumerReport, DrainPolicy, Producer, ProducerReport};

use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{info, warn};

/// Configuration for a [`Supervisor`].
#[derive(Debug, Clone)]
pub struct SupervisorBuilder {
    capacity: usize,
    producers: usize,
    consumers: usize,
    timeout: Option<Duration>,
    drain_policy: DrainPolicy,
    producer_jitter: Option<Duration>,
    consumer_jitter: Option<Duration>,
}

impl Default for SupervisorBuilder {
    fn default() -> Self {
        Self {
            capacity: 10,
            producers: 1,
            consumers: 1,
            timeout: None, // Run until triggered
            drain_policy: DrainPolicy::Drain,
            producer_jitter: None,
            consumer_jitter: None,
        }
    }
}

impl SupervisorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_producers(mut self, producers: usize) -> Self {
        self.producers = producers;
        self
    }

    pub fn with_consumers(mut self, consumers: usize) -> Self {
        self.consumers = consumers;
        self
    }

    /// Fire the shutdown token automatically after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_drain_policy(mut self, policy: DrainPolicy) -> Self {
        self.drain_policy = policy;
        self
    }

    pub fn with_producer_pacing(mut self, max_jitter: Duration) -> Self {
        self.producer_jitter = Some(max_jitter);
        self
    }

    pub fn with_consumer_pacing(mut self, max_jitter: Duration) -> Self {
        self.consumer_jitter = Some(max_jitter);
        self
    }

    /// Validate the configuration and create the queue and token.
    ///
    /// The deadline, if any, starts counting here.
    pub fn build<T: Send + 'static>(self) -> Result<Supervisor<T>, ConfigError> {
        if self.producers == 0 {
            return Err(ConfigError::NoWorkers { role: "producer" });
        }
        if self.consumers == 0 {
            return Err(ConfigError::NoWorkers { role: "consumer" });
        }
        let queue = QueueBuilder::new().with_capacity(self.capacity).build()?;
        let token = match self.timeout {
            Some(timeout) => CancelToken::with_timeout(timeout),
            None => CancelToken::new(),
        };
        Ok(Supervisor {
            queue,
            token,
            config: self,
        })
    }
}

/// Owns the queue and the shutdown token before any role is started.
pub struct Supervisor<T> {
    queue: BlockingQueue<T>,
    token: CancelToken,
    config: SupervisorBuilder,
}

impl<T: Send + 'static> Supervisor<T> {
    pub fn queue(&self) -> &BlockingQueue<T> {
        &self.queue
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Start every producer and consumer on its own named thread.
    ///
    /// `make_source` and `make_handler` are called once per role with the
    /// role's id and return the per-thread message source and handler.
    pub fn spawn<MS, S, MH, H>(
        self,
        mut make_source: MS,
        mut make_handler: MH,
    ) -> Result<RunningSupervisor<T>, SupervisorError>
    where
        MS: FnMut(u32) -> S,
        S: FnMut(u64) -> Option<T> + Send + 'static,
        MH: FnMut(u32) -> H,
        H: FnMut(T) + Send + 'static,
    {
        let mut running = RunningSupervisor {
            queue: self.queue,
            token: self.token,
            producers: Vec::with_capacity(self.config.producers),
            consumers: Vec::with_capacity(self.config.consumers),
        };

        for id in 0..self.config.consumers as u32 {
            let mut consumer = Consumer::new(running.queue.clone(), running.token.clone(), id)
                .with_policy(self.config.drain_policy);
            if let Some(max) = self.config.consumer_jitter {
                consumer = consumer.with_pacing(max);
            }
            let handler = make_handler(id);
            let handle = thread::Builder::new()
                .name(format!("consumer-{id}"))
                .spawn(move || consumer.run(handler));
            match handle {
                Ok(handle) => running.consumers.push(handle),
                Err(e) => return Err(running.abort(e)),
            }
        }

        for id in 0..self.config.producers as u32 {
            let mut producer = Producer::new(running.queue.clone(), running.token.clone(), id);
            if let Some(max) = self.config.producer_jitter {
                producer = producer.with_pacing(max);
            }
            let source = make_source(id);
            let handle = thread::Builder::new()
                .name(format!("producer-{id}"))
                .spawn(move || producer.run(source));
            match handle {
                Ok(handle) => running.producers.push(handle),
                Err(e) => return Err(running.abort(e)),
            }
        }

        info!(
            capacity = running.queue.capacity(),
            producers = running.producers.len(),
            consumers = running.consumers.len(),
            "supervisor started"
        );
        Ok(running)
    }
}

/// Final accounting of a supervised run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    pub reason: CancelReason,
    pub producers: Vec<ProducerReport>,
    pub consumers: Vec<ConsumerReport>,
}

impl ShutdownReport {
    pub fn produced(&self) -> u64 {
        self.producers.iter().map(|p| p.sent).sum()
    }

    pub fn consumed(&self) -> u64 {
        self.consumers.iter().map(|c| c.received).sum()
    }

    /// Every successfully enqueued message was handed to a consumer.
    pub fn is_lossless(&self) -> bool {
        self.produced() == self.consumed()
    }
}

/// Role threads in flight.
pub struct RunningSupervisor<T> {
    queue: BlockingQueue<T>,
    token: CancelToken,
    producers: Vec<JoinHandle<ProducerReport>>,
    consumers: Vec<JoinHandle<ConsumerReport>>,
}

impl<T> RunningSupervisor<T> {
    pub fn queue(&self) -> &BlockingQueue<T> {
        &self.queue
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Request shutdown now instead of waiting for the deadline.
    pub fn trigger(&self) -> bool {
        self.token.cancel()
    }

    /// Wait for the token, then stop producers, close the queue and let
    /// consumers drain.
    ///
    /// Every thread is joined even when one of them panicked; the first
    /// panic is reported afterwards.
    pub fn shutdown(self) -> Result<ShutdownReport, SupervisorError> {
        let reason = self.token.wait();
        info!(%reason, "shutdown requested, stopping producers");

        let mut panicked: Option<String> = None;

        let mut producers = Vec::with_capacity(self.producers.len());
        for handle in self.producers {
            let name = thread_name(&handle);
            match handle.join() {
                Ok(report) => producers.push(report),
                Err(_) => {
                    warn!(role = %name, "role thread panicked");
                    panicked.get_or_insert(name);
                }
            }
        }

        self.queue.close();
        info!(buffered = self.queue.len(), "queue closed, draining consumers");

        let mut consumers = Vec::with_capacity(self.consumers.len());
        for handle in self.consumers {
            let name = thread_name(&handle);
            match handle.join() {
                Ok(report) => consumers.push(report),
                Err(_) => {
                    warn!(role = %name, "role thread panicked");
                    panicked.get_or_insert(name);
                }
            }
        }

        if let Some(role) = panicked {
            return Err(SupervisorError::RolePanicked { role });
        }

        let report = ShutdownReport {
            reason,
            producers,
            consumers,
        };
        info!(
            %reason,
            produced = report.produced(),
            consumed = report.consumed(),
            "shutdown complete"
        );
        Ok(report)
    }

    /// Tear down after a spawn failure: cancel, close, join what started.
    fn abort(self, err: std::io::Error) -> SupervisorError {
        warn!(error = %err, "failed to spawn role thread, aborting");
        self.token.cancel();
        self.queue.close();
        for handle in self.producers {
            let _ = handle.join();
        }
        for handle in self.consumers {
            let _ = handle.join();
        }
        SupervisorError::Spawn(err)
    }
}

fn thread_name<R>(handle: &JoinHandle<R>) -> String {
    handle.thread().name().unwrap_or("<unnamed>").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn abort_stops_started_roles_and_reports_spawn_error() {
        let queue = BlockingQueue::<u8>::new(2);
        let token = CancelToken::new();
        let consumer = Consumer::new(queue.clone(), token.clone(), 0);
        let handle = thread::Builder::new()
            .name("consumer-0".into())
            .spawn(move || consumer.run(|_| {}))
            .unwrap();

        let running = RunningSupervisor {
            queue: queue.clone(),
            token: token.clone(),
            producers: Vec::new(),
            consumers: vec![handle],
        };
        let err = running.abort(io::Error::new(io::ErrorKind::Other, "no threads left"));

        assert!(matches!(err, SupervisorError::Spawn(ref e) if e.kind() == io::ErrorKind::Other));
        assert_eq!(err.to_string(), "failed to spawn role thread: no threads left");
        assert!(queue.is_closed());
        assert_eq!(token.reason(), Some(CancelReason::Triggered));
    }
}
