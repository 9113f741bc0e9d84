//! Cancellation signal shared by role loops and blocked queue operations.
//!
//! A [`CancelToken`] fires either when [`CancelToken::cancel`] is called or
//! when its deadline passes. Queue waits observe both: an explicit cancel
//! wakes every queue that registered itself on the token, and a deadline is
//! honoured by bounding the condition wait at that instant.

use crossbeam_utils::CachePadded;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// Why a token fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// `cancel()` was called explicitly (e.g. a Ctrl+C handler).
    Triggered,
    /// The token's deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Triggered => f.write_str("cancellation triggered"),
            CancelReason::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// Something blocked on its own condition variables that must re-check its
/// predicate when a token fires.
///
/// Implementors must take the same lock their waiters hold before notifying,
/// so a waiter that checked the token and is about to park cannot miss it.
pub(crate) trait Interrupt: Send + Sync {
    fn interrupt(&self);
}

struct TokenState {
    reason: Option<CancelReason>,
    listeners: Vec<Weak<dyn Interrupt>>,
}

struct Inner {
    /// Fast-path flag, set once `state.reason` is populated.
    fired: CachePadded<AtomicBool>,
    deadline: Option<Instant>,
    state: Mutex<TokenState>,
    changed: Condvar,
}

/// A cloneable, thread-safe cancellation signal.
///
/// All clones observe the same state. Once fired a token stays fired; the
/// first reason recorded wins.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// A token that only fires on an explicit [`cancel`](Self::cancel).
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A token that fires at `deadline` or on an explicit cancel, whichever
    /// comes first.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::build(Some(deadline))
    }

    /// Shorthand for `with_deadline(Instant::now() + timeout)`.
    ///
    /// A timeout too large to represent as an `Instant` (e.g.
    /// `Duration::MAX`) means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Instant::now().checked_add(timeout))
    }

    fn build(deadline: Option<Instant>) -> Self {
        Self {
            inner: Arc::new(Inner {
                fired: CachePadded::new(AtomicBool::new(false)),
                deadline,
                state: Mutex::new(TokenState {
                    reason: None,
                    listeners: Vec::new(),
                }),
                changed: Condvar::new(),
            }),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Fire the token. Returns `true` if this call fired it, `false` if it
    /// had already fired (for either reason).
    pub fn cancel(&self) -> bool {
        self.fire(CancelReason::Triggered)
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// The reason the token fired, or `None` while it is still live.
    ///
    /// A passed deadline is latched here, so a later `cancel()` cannot
    /// change the recorded reason.
    pub fn reason(&self) -> Option<CancelReason> {
        if self.inner.fired.load(Ordering::Acquire) {
            return self.inner.state.lock().reason;
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.fire(CancelReason::DeadlineExceeded);
                self.inner.state.lock().reason
            }
            _ => None,
        }
    }

    /// Block the calling thread until the token fires.
    pub fn wait(&self) -> CancelReason {
        let mut state = self.inner.state.lock();
        loop {
            if let Some(reason) = state.reason {
                return reason;
            }
            match self.inner.deadline {
                Some(deadline) => {
                    if self.inner.changed.wait_until(&mut state, deadline).timed_out() {
                        drop(state);
                        self.fire(CancelReason::DeadlineExceeded);
                        state = self.inner.state.lock();
                    }
                }
                None => self.inner.changed.wait(&mut state),
            }
        }
    }

    /// Block for at most `timeout`. Returns the reason if the token fired
    /// within that window, `None` otherwise.
    ///
    /// Role loops use this as an interruptible sleep. A timeout that
    /// overflows `Instant` waits until the token fires.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<CancelReason> {
        let until = match (Instant::now().checked_add(timeout), self.inner.deadline) {
            (Some(until), Some(deadline)) => Some(until.min(deadline)),
            (until, deadline) => until.or(deadline),
        };
        let Some(until) = until else {
            return Some(self.wait());
        };
        let mut state = self.inner.state.lock();
        while state.reason.is_none() {
            if self.inner.changed.wait_until(&mut state, until).timed_out() {
                break;
            }
        }
        drop(state);
        self.reason()
    }

    /// Register `listener` to be interrupted when the token is cancelled.
    ///
    /// Registration is idempotent per listener. Dead listeners are pruned.
    pub(crate) fn register(&self, listener: Weak<dyn Interrupt>) {
        let mut state = self.inner.state.lock();
        if state.reason.is_some() {
            // The caller checks the token after registering and will not park.
            return;
        }
        let addr = listener.as_ptr() as *const ();
        state.listeners.retain(|l| l.strong_count() > 0);
        if !state
            .listeners
            .iter()
            .any(|l| l.as_ptr() as *const () == addr)
        {
            state.listeners.push(listener);
        }
    }

    fn fire(&self, reason: CancelReason) -> bool {
        let listeners = {
            let mut state = self.inner.state.lock();
            if state.reason.is_some() {
                return false;
            }
            state.reason = Some(reason);
            self.inner.fired.store(true, Ordering::Release);
            self.inner.changed.notify_all();
            std::mem::take(&mut state.listeners)
        };

        // Deadline waiters bound their own waits, and a deadline may be latched
        // by a waiter that already holds a listener's lock. Only an explicit
        // cancel interrupts listeners, and never under the token lock.
        if reason == CancelReason::Triggered {
            for listener in listeners.iter().filter_map(Weak::upgrade) {
                listener.interrupt();
            }
        }
        true
    }
}
