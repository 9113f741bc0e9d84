// Message unit carried by the queue.

use std::time::{SystemTime, UNIX_EPOCH};

/// Tracing metadata attached to every message.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MessageMeta {
    /// Identifier assigned by the producer; strictly increasing per producer.
    pub message_id: u64,
    /// Producer that created the message (0 when built outside a role loop).
    pub producer_id: u32,
    /// Wall-clock creation time, nanoseconds since the Unix epoch.
    pub timestamp_ns: u64,
}

/// An opaque payload plus its metadata. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    meta: MessageMeta,
    payload: Vec<u8>,
}

impl Message {
    pub fn new(message_id: u64, payload: impl Into<Vec<u8>>) -> Self {
        Self::from_producer(0, message_id, payload)
    }

    pub fn from_producer(producer_id: u32, message_id: u64, payload: impl Into<Vec<u8>>) -> Self {
        let timestamp_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;

        Self {
            meta: MessageMeta {
                message_id,
                producer_id,
                timestamp_ns,
            },
            payload: payload.into(),
        }
    }

    #[inline]
    pub fn meta(&self) -> &MessageMeta {
        &self.meta
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.meta.message_id
    }

    #[inline]
    pub fn producer_id(&self) -> u32 {
        self.meta.producer_id
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Consume the message, keeping only the payload.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}
