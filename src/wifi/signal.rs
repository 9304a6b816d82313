//! Two-flag handoff between the event context and a blocked caller.
//!
//! The event handler raises exactly one of [`Signal::Connected`] or
//! [`Signal::Failed`]; the caller blocks in [`SignalSet::wait`] until it
//! does. The first raise wins and later raises are ignored, so the outcome
//! of an attempt never changes once observed.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const CONNECTED_BIT: u8 = 1 << 0;
const FAILED_BIT: u8 = 1 << 1;

/// Terminal signal for one bring-up attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Station obtained an IP address.
    Connected,
    /// Retries were exhausted.
    Failed,
}

impl Signal {
    fn bit(self) -> u8 {
        match self {
            Self::Connected => CONNECTED_BIT,
            Self::Failed => FAILED_BIT,
        }
    }

    fn from_bits(bits: u8) -> Option<Self> {
        if bits & CONNECTED_BIT != 0 {
            Some(Self::Connected)
        } else if bits & FAILED_BIT != 0 {
            Some(Self::Failed)
        } else {
            None
        }
    }
}

/// Set-once pair of flags with a blocking wait.
#[derive(Debug, Default)]
pub struct SignalSet {
    bits: Mutex<u8>,
    raised: Condvar,
}

impl SignalSet {
    /// Create a set with both flags clear.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise a flag and wake the waiter.
    ///
    /// Returns `false` without touching the flags if either one is already
    /// set.
    pub fn raise(&self, signal: Signal) -> bool {
        let mut bits = self.lock();
        if *bits != 0 {
            return false;
        }
        *bits = signal.bit();
        self.raised.notify_all();
        true
    }

    /// Currently raised signal, without blocking.
    pub fn peek(&self) -> Option<Signal> {
        Signal::from_bits(*self.lock())
    }

    /// Block until a flag is raised.
    ///
    /// With `timeout` set, returns `None` if nothing was raised in time.
    /// Without it, the wait is unbounded.
    pub fn wait(&self, timeout: Option<Duration>) -> Option<Signal> {
        let guard = self.lock();
        let bits = match timeout {
            Some(timeout) => {
                self.raised
                    .wait_timeout_while(guard, timeout, |bits| *bits == 0)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
            None => self
                .raised
                .wait_while(guard, |bits| *bits == 0)
                .unwrap_or_else(PoisonError::into_inner),
        };
        Signal::from_bits(*bits)
    }

    // A poisoned lock still holds a valid bit pattern.
    fn lock(&self) -> MutexGuard<'_, u8> {
        self.bits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_starts_clear() {
        let set = SignalSet::new();
        assert_eq!(set.peek(), None);
    }

    #[test]
    fn test_first_raise_wins() {
        let set = SignalSet::new();
        assert!(set.raise(Signal::Failed));
        assert!(!set.raise(Signal::Connected));
        assert!(!set.raise(Signal::Failed));
        assert_eq!(set.peek(), Some(Signal::Failed));
    }

    #[test]
    fn test_wait_returns_already_raised() {
        let set = SignalSet::new();
        set.raise(Signal::Connected);
        assert_eq!(set.wait(None), Some(Signal::Connected));
    }

    #[test]
    fn test_wait_times_out() {
        let set = SignalSet::new();
        assert_eq!(set.wait(Some(Duration::from_millis(20))), None);
    }

    #[test]
    fn test_wait_across_threads() {
        let set = Arc::new(SignalSet::new());
        let raiser = set.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            raiser.raise(Signal::Connected)
        });
        assert_eq!(set.wait(Some(Duration::from_secs(5))), Some(Signal::Connected));
        assert!(handle.join().unwrap());
    }
}
