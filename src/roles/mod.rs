mod consumer;
mod producer;

pub use consumer::{Consumer, ConsumerReport, DrainPolicy};
pub use producer::{Producer, ProducerReport};

use crate::cancel::CancelReason;
use std::fmt;

/// Why a role loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The queue reported `Closed` (for consumers: closed and drained).
    Closed,
    /// The cancellation token fired.
    Cancelled(CancelReason),
    /// The producer's message source ran dry.
    Exhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Closed => f.write_str("queue closed"),
            StopReason::Cancelled(reason) => write!(f, "{reason}"),
            StopReason::Exhausted => f.write_str("source exhausted"),
        }
    }
}
