// Bounded blocking queue: a ring buffer behind one lock and two conditions.

use super::ring::RingBuffer;
use crate::cancel::{CancelToken, Interrupt};
use crate::error::{QueueError, TryDequeueError, TryEnqueueError};

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::{Arc, Weak};

pub(crate) struct State<T> {
    pub(crate) ring: RingBuffer<T>,
    /// Monotonic: false -> true, never reversed.
    pub(crate) closed: bool,
}

pub(crate) struct Shared<T> {
    pub(crate) state: Mutex<State<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T: Send> Interrupt for Shared<T> {
    fn interrupt(&self) {
        // Taking the lock orders this wake after any waiter that has checked
        // its token but not yet parked.
        let _state = self.state.lock();
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }
}

/// A bounded, closeable, multi-producer multi-consumer FIFO queue.
///
/// ### Concurrency Design:
/// - **Enqueue**: waits on `not_full` while the ring is full and the queue is
///   open. A closed queue never accepts a message, even from a producer that
///   was already waiting when `close` ran.
/// - **Dequeue**: waits on `not_empty` while the ring is empty and the queue
///   is open. Buffered messages are always handed out before `Closed` is
///   reported, so closing never discards data.
/// - **Close**: flips the flag once and broadcasts on both conditions.
///
/// Successful operations signal exactly one waiter on the opposite
/// condition. The handle is cheap to clone; every clone refers to the same
/// queue.
pub struct BlockingQueue<T> {
    pub(crate) shared: Arc<Shared<T>>,
}

impl<T> Clone for BlockingQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> BlockingQueue<T> {
    /// Create an open queue holding at most `capacity` messages.
    ///
    /// # Panics
    /// Panics if `capacity` is zero. Use [`QueueBuilder`](super::QueueBuilder)
    /// for a fallible constructor.
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    ring: RingBuffer::new(capacity),
                    closed: false,
                }),
                not_full: Condvar::new(),
                not_empty: Condvar::new(),
            }),
        }
    }

    /// Append `msg`, blocking while the queue is full.
    ///
    /// # Returns
    /// * `Ok(())` once the message is buffered
    /// * `Err(QueueError::Closed)` if the queue is (or becomes) closed; the
    ///   message is dropped
    pub fn enqueue(&self, msg: T) -> Result<(), QueueError> {
        let mut state = self.shared.state.lock();
        let mut msg = msg;
        loop {
            match Self::push_locked(&self.shared, &mut state, msg)? {
                None => return Ok(()),
                Some(rejected) => msg = rejected,
            }
            self.shared.not_full.wait(&mut state);
        }
    }

    /// Remove the oldest message, blocking while the queue is empty and open.
    ///
    /// # Returns
    /// * `Ok(msg)` for every buffered message, even after `close`
    /// * `Err(QueueError::Closed)` once the queue is closed and drained
    pub fn dequeue(&self) -> Result<T, QueueError> {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(msg) = Self::pop_locked(&self.shared, &mut state)? {
                return Ok(msg);
            }
            self.shared.not_empty.wait(&mut state);
        }
    }

    /// Non-blocking enqueue. Hands the message back on failure.
    pub fn try_enqueue(&self, msg: T) -> Result<(), TryEnqueueError<T>> {
        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(TryEnqueueError::Closed(msg));
        }
        match state.ring.push(msg) {
            Ok(()) => {
                self.shared.not_empty.notify_one();
                Ok(())
            }
            Err(msg) => Err(TryEnqueueError::Full(msg)),
        }
    }

    /// Non-blocking dequeue.
    pub fn try_dequeue(&self) -> Result<T, TryDequeueError> {
        let mut state = self.shared.state.lock();
        match Self::pop_locked(&self.shared, &mut state) {
            Ok(Some(msg)) => Ok(msg),
            Ok(None) => Err(TryDequeueError::Empty),
            Err(_) => Err(TryDequeueError::Closed),
        }
    }

    /// Close the queue and wake every waiter.
    ///
    /// Idempotent: returns `true` only for the call that performed the
    /// transition. Buffered messages stay retrievable.
    pub fn close(&self) -> bool {
        let mut state = self.shared.state.lock();
        if state.closed {
            return false;
        }
        state.closed = true;
        self.shared.not_full.notify_all();
        self.shared.not_empty.notify_all();
        true
    }

    pub fn capacity(&self) -> usize {
        self.shared.state.lock().ring.capacity()
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().ring.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.shared.state.lock().ring.is_full()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// `Ok(None)` on success, `Ok(Some(msg))` if the ring is full.
    fn push_locked(
        shared: &Shared<T>,
        state: &mut MutexGuard<'_, State<T>>,
        msg: T,
    ) -> Result<Option<T>, QueueError> {
        if state.closed {
            return Err(QueueError::Closed);
        }
        match state.ring.push(msg) {
            Ok(()) => {
                shared.not_empty.notify_one();
                Ok(None)
            }
            Err(msg) => Ok(Some(msg)),
        }
    }

    /// Draining comes before the closed check.
    fn pop_locked(
        shared: &Shared<T>,
        state: &mut MutexGuard<'_, State<T>>,
    ) -> Result<Option<T>, QueueError> {
        if let Some(msg) = state.ring.pop() {
            shared.not_full.notify_one();
            return Ok(Some(msg));
        }
        if state.closed {
            return Err(QueueError::Closed);
        }
        Ok(None)
    }
}

impl<T: Send + 'static> BlockingQueue<T> {
    /// Like [`enqueue`](Self::enqueue), but a wait is abandoned when `token`
    /// fires, returning `QueueError::Cancelled`.
    ///
    /// Cancellation only interrupts waiting: if space is available the
    /// message is enqueued even when the token has already fired. Closure
    /// takes precedence over cancellation.
    pub fn enqueue_cancellable(&self, msg: T, token: &CancelToken) -> Result<(), QueueError> {
        let mut state = self.shared.state.lock();
        let mut msg = msg;
        loop {
            match Self::push_locked(&self.shared, &mut state, msg)? {
                None => return Ok(()),
                Some(rejected) => msg = rejected,
            }
            self.wait_cancellable(&self.shared.not_full, &mut state, token)?;
        }
    }

    /// Like [`dequeue`](Self::dequeue), but a wait is abandoned when `token`
    /// fires, returning `QueueError::Cancelled`.
    pub fn dequeue_cancellable(&self, token: &CancelToken) -> Result<T, QueueError> {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(msg) = Self::pop_locked(&self.shared, &mut state)? {
                return Ok(msg);
            }
            self.wait_cancellable(&self.shared.not_empty, &mut state, token)?;
        }
    }

    fn wait_cancellable(
        &self,
        condition: &Condvar,
        state: &mut MutexGuard<'_, State<T>>,
        token: &CancelToken,
    ) -> Result<(), QueueError> {
        // Register before checking, so a cancel racing with this wait either
        // is seen by the check or finds this queue among its listeners.
        token.register(self.listener());
        if let Some(reason) = token.reason() {
            return Err(QueueError::Cancelled(reason));
        }
        match token.deadline() {
            Some(deadline) => {
                condition.wait_until(state, deadline);
            }
            None => condition.wait(state),
        }
        Ok(())
    }

    fn listener(&self) -> Weak<dyn Interrupt> {
        let shared: Arc<dyn Interrupt> = self.shared.clone();
        Arc::downgrade(&shared)
    }
}
