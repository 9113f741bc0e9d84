use super::BlockingQueue;
use crate::error::ConfigError;

/// Fallible construction of a [`BlockingQueue`].
pub struct QueueBuilder {
    capacity: usize,
}

impl Default for QueueBuilder {
    fn default() -> Self {
        Self {
            capacity: 10, // Default capacity
        }
    }
}

impl QueueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn build<T>(self) -> Result<BlockingQueue<T>, ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(BlockingQueue::new(self.capacity))
    }
}
