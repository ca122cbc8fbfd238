//! Cooperative stop signal shared between the host and the worker.
//!
//! Notes:
//! - Raising the signal is one-way and idempotent.
//! - `wait_timeout` lets the worker sleep its cool-down and still wake early on stop.
//! - Safe to raise from a ctrlc handler thread.

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a cooperative stop (idempotent).
    pub fn request(&self) {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(|p| p.into_inner());
        *stopped = true;
        cvar.notify_all();
    }

    pub fn is_requested(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Sleep up to `timeout`; returns true if a stop was requested.
    /// A timeout past what `Instant` can represent waits for the stop alone.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(|p| p.into_inner());
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            while !*stopped {
                stopped = cvar.wait(stopped).unwrap_or_else(|p| p.into_inner());
            }
            return true;
        };
        while !*stopped {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            stopped = match cvar.wait_timeout(stopped, deadline - now) {
                Ok((guard, _)) => guard,
                Err(p) => p.into_inner().0,
            };
        }
        *stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn wait_times_out_without_request() {
        let s = StopSignal::new();
        let start = Instant::now();
        assert!(!s.wait_timeout(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn request_wakes_waiter_early() {
        let s = StopSignal::new();
        let s2 = s.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            s2.request();
        });
        let start = Instant::now();
        assert!(s.wait_timeout(Duration::from_secs(30)));
        assert!(start.elapsed() < Duration::from_secs(10));
        assert!(s.is_requested());
    }

    #[test]
    fn unrepresentable_timeout_waits_for_request() {
        let s = StopSignal::new();
        let s2 = s.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            s2.request();
        });
        assert!(s.wait_timeout(Duration::from_secs(u64::MAX)));
        assert!(s.wait_timeout(Duration::MAX));
    }
}
