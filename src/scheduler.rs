//! Fixed-delay scheduler.
//! Runs one pass after every cool-down on a single named worker thread until
//! stopped. A failing or panicking pass is logged and the loop carries on.
//!
//! States: Idle -> Running -> Idle -> ... -> Stopped.
//! A stop request wakes the cool-down wait but never interrupts a running pass.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::errors::OrganizerError;
use crate::outcome::PassReport;
use crate::reconcile::Reconciler;
use crate::shutdown::StopSignal;

/// Work executed once per cycle.
pub trait Pass: Send + 'static {
    fn run_pass(&mut self) -> Result<PassReport, OrganizerError>;
}

impl Pass for Reconciler {
    fn run_pass(&mut self) -> Result<PassReport, OrganizerError> {
        Reconciler::run_pass(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

impl SchedulerState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => SchedulerState::Idle,
            1 => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    cool_down: Duration,
}

impl Scheduler {
    pub fn new(cool_down: Duration) -> Self {
        Self { cool_down }
    }

    /// Spawn the worker. Nothing runs until the first cool-down has elapsed.
    pub fn start<P: Pass>(&self, pass: P) -> io::Result<SchedulerHandle> {
        let stop = StopSignal::new();
        let state = Arc::new(AtomicU8::new(SchedulerState::Idle as u8));
        let passes = Arc::new(AtomicU64::new(0));

        let worker = Worker {
            cool_down: self.cool_down,
            stop: stop.clone(),
            state: Arc::clone(&state),
            passes: Arc::clone(&passes),
        };
        let thread = thread::Builder::new()
            .name("desk-organizer-worker".into())
            .spawn(move || worker.run(pass))?;

        info!(cool_down_secs = self.cool_down.as_secs_f64(), "Scheduler started");
        Ok(SchedulerHandle {
            stop,
            state,
            passes,
            thread: Some(thread),
        })
    }
}

struct Worker {
    cool_down: Duration,
    stop: StopSignal,
    state: Arc<AtomicU8>,
    passes: Arc<AtomicU64>,
}

impl Worker {
    fn run<P: Pass>(self, mut pass: P) {
        loop {
            if self.stop.wait_timeout(self.cool_down) {
                break;
            }
            self.state.store(SchedulerState::Running as u8, Ordering::SeqCst);
            match panic::catch_unwind(AssertUnwindSafe(|| pass.run_pass())) {
                Ok(Ok(report)) => {
                    debug!(entries = report.entries().len(), "Pass finished");
                }
                Ok(Err(e)) => {
                    error!(code = e.code(), error = %e, "Pass failed; retrying after cool-down");
                }
                Err(payload) => {
                    error!(panic = %panic_message(&*payload), "Pass panicked; retrying after cool-down");
                }
            }
            self.passes.fetch_add(1, Ordering::SeqCst);
            self.state.store(SchedulerState::Idle as u8, Ordering::SeqCst);
            if self.stop.is_requested() {
                break;
            }
        }
        self.state.store(SchedulerState::Stopped as u8, Ordering::SeqCst);
        info!(passes = self.passes.load(Ordering::SeqCst), "Scheduler stopped");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Control surface for a running scheduler.
#[derive(Debug)]
pub struct SchedulerHandle {
    stop: StopSignal,
    state: Arc<AtomicU8>,
    passes: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Ask the worker to stop after the current cool-down or pass.
    pub fn stop(&self) {
        self.stop.request();
    }

    /// Clone of the stop signal, e.g. for a signal handler.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Passes attempted so far, successful or not.
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::SeqCst)
    }

    /// Wait for the worker to exit. Call `stop` first or this blocks forever.
    pub fn join(mut self) {
        if let Some(t) = self.thread.take() {
            if t.join().is_err() {
                error!("Scheduler worker terminated abnormally");
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        // A detached worker would keep moving files after its owner is gone.
        self.stop.request();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    struct Flaky {
        calls: u32,
    }

    impl Pass for Flaky {
        fn run_pass(&mut self) -> Result<PassReport, OrganizerError> {
            self.calls += 1;
            match self.calls % 3 {
                1 => Err(OrganizerError::UnexpectedIo {
                    path: "src".into(),
                    source: io::Error::other("boom"),
                }),
                2 => panic!("pass exploded"),
                _ => Ok(PassReport::default()),
            }
        }
    }

    fn wait_for(handle: &SchedulerHandle, passes: u64) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while handle.passes() < passes {
            assert!(Instant::now() < deadline, "scheduler made no progress");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn failures_and_panics_do_not_end_the_loop() {
        let handle = Scheduler::new(Duration::from_millis(5))
            .start(Flaky { calls: 0 })
            .unwrap();
        wait_for(&handle, 6);
        assert_ne!(handle.state(), SchedulerState::Stopped);
        handle.stop();
        let signal = handle.stop_signal();
        handle.join();
        assert!(signal.is_requested());
    }

    #[test]
    fn stop_during_cool_down_exits_promptly() {
        let handle = Scheduler::new(Duration::from_secs(3600))
            .start(Flaky { calls: 0 })
            .unwrap();
        assert_eq!(handle.state(), SchedulerState::Idle);
        let start = Instant::now();
        handle.stop();
        let state = Arc::clone(&handle.state);
        handle.join();
        assert!(start.elapsed() < Duration::from_secs(10));
        assert_eq!(SchedulerState::from_u8(state.load(Ordering::SeqCst)), SchedulerState::Stopped);
    }
}
