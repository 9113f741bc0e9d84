// Fixed-capacity circular storage backing the blocking queue.

/// A bounded FIFO ring of `T`.
///
/// This struct carries no synchronization of its own. It is owned by
/// [`BlockingQueue`](crate::queue::BlockingQueue) and only ever touched while
/// the queue's lock is held.
///
/// ### Layout:
/// - `head` is the next slot to read from.
/// - `tail` is the next slot to write into.
/// - `len` is tracked explicitly, since `head == tail` holds both when the
///   ring is empty and when it is full.
pub(crate) struct RingBuffer<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    tail: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    /// Allocate a ring with `capacity` slots.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub(crate) fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");
        let slots = (0..capacity).map(|_| None).collect::<Vec<_>>();
        Self {
            slots: slots.into_boxed_slice(),
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Write `item` into the tail slot.
    /// Returns the item back if the ring is full; nothing is modified then.
    pub(crate) fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        debug_assert!(self.slots[self.tail].is_none(), "tail slot still occupied");
        self.slots[self.tail] = Some(item);
        self.tail = (self.tail + 1) % self.capacity();
        self.len += 1;
        Ok(())
    }

    /// Take the item at the head slot, or `None` if the ring is empty.
    pub(crate) fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.head].take();
        debug_assert!(item.is_some(), "head slot empty while len > 0");
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        item
    }
}
