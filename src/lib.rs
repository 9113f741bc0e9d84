//! A bounded, closeable, thread-safe in-process message queue.
//!
//! Producers block while the queue is full, consumers block while it is
//! empty, and `close` wakes everyone: late producers get `Closed`, consumers
//! drain what is buffered and then get `Closed`. A [`CancelToken`] lets a
//! shutdown interrupt blocked waits, and [`Supervisor`] wires the canonical
//! stop-producers / close / drain sequence.

pub mod cancel;
pub mod error;
pub mod message;
pub mod queue;
pub mod roles;
pub mod shutdown;
pub mod telemetry;
mod debug;

// re-exports for stable paths
pub use cancel::{CancelReason, CancelToken};
pub use error::{ConfigError, QueueError, SupervisorError, TryDequeueError, TryEnqueueError};
pub use message::{Message, MessageMeta};
pub use queue::{BlockingQueue, QueueBuilder};
pub use roles::{Consumer, ConsumerReport, DrainPolicy, Producer, ProducerReport, StopReason};
pub use shutdown::{RunningSupervisor, ShutdownReport, Supervisor, SupervisorBuilder};
