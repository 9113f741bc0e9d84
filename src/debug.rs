use crate::cancel::CancelToken;
use crate::queue::BlockingQueue;
use std::fmt;

/// Debug function for BlockingQueue
///
/// Shows capacity, buffered length and the closed flag. Never prints
/// message contents, so `T` needs no `Debug` bound.
pub fn debug_blocking_queue<T>(queue: &BlockingQueue<T>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = queue.shared.state.lock();
    f.debug_struct("BlockingQueue")
        .field("capacity", &state.ring.capacity())
        .field("len", &state.ring.len())
        .field("closed", &state.closed)
        .finish_non_exhaustive()
}

/// Debug function for CancelToken
pub fn debug_cancel_token(token: &CancelToken, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CancelToken")
        .field("reason", &token.reason())
        .field("deadline", &token.deadline())
        .finish()
}

impl<T> fmt::Debug for BlockingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_blocking_queue(self, f)
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_cancel_token(self, f)
    }
}
