use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// Blocking FIFO handoff used to broadcast phase changes.
///
/// Each sent value is taken by exactly one receiver. Receivers block while the
/// queue is empty instead of getting a sentinel back.
#[derive(Debug)]
pub struct PhaseQueue<T> {
    messages: Mutex<VecDeque<T>>,
    available: Condvar,
    send_delay: Duration,
}

impl<T: Debug> PhaseQueue<T> {
    pub fn new() -> Self {
        Self::with_send_delay(Duration::ZERO)
    }

    /// `send_delay` is slept before every send, outside the lock.
    pub fn with_send_delay(send_delay: Duration) -> Self {
        Self {
            messages: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            send_delay,
        }
    }

    pub fn send(&self, msg: T) {
        self.push(msg, None);
    }

    /// Sends `msg` after dropping the oldest pending values, so that at most
    /// `max_pending` values are queued once it is in. A blocked receiver only
    /// exists while the queue is empty, so nothing it waits for is dropped.
    pub fn send_bounded(&self, msg: T, max_pending: usize) {
        self.push(msg, Some(max_pending.max(1)));
    }

    /// Blocks until a value is available and takes the oldest one.
    pub fn receive(&self) -> T {
        let mut messages = self
            .available
            .wait_while(self.lock(), |messages| messages.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        match messages.pop_front() {
            Some(msg) => msg,
            None => unreachable!("wait_while returned with an empty phase queue"),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn push(&self, msg: T, max_pending: Option<usize>) {
        if !self.send_delay.is_zero() {
            thread::sleep(self.send_delay);
        }
        let mut messages = self.lock();
        if let Some(max_pending) = max_pending {
            while messages.len() >= max_pending {
                if let Some(stale) = messages.pop_front() {
                    log::debug!("Dropping stale message {:?}", stale);
                }
            }
        }
        log::debug!("Message {:?} has been sent to the queue", msg);
        messages.push_back(msg);
        self.available.notify_one();
    }

    // No code path panics while holding this lock, so a poisoned queue is
    // still consistent.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Debug> Default for PhaseQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
