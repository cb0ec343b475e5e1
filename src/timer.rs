//! One-shot scheduled task
//!
//! Runs a closure once on a background thread after a delay. The returned
//! handle can cancel the task before it fires or wait for it. Dropping the
//! handle detaches the task; it still fires.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

/// Handle to a task scheduled with [`schedule`]
pub struct TimerHandle {
    wake_tx: Sender<()>,
    state: Arc<AtomicU8>,
    thread: Option<JoinHandle<()>>,
}

/// Schedule `task` to run once after `delay`
pub fn schedule<F>(delay: Duration, task: F) -> TimerHandle
where
    F: FnOnce() + Send + 'static,
{
    let (wake_tx, wake_rx) = mpsc::channel::<()>();
    let state = Arc::new(AtomicU8::new(PENDING));
    let state_for_thread = state.clone();
    let deadline = Instant::now() + delay;

    let thread = std::thread::spawn(move || {
        match wake_rx.recv_timeout(delay) {
            Ok(()) => {}
            Err(RecvTimeoutError::Timeout) => {}
            // Handle dropped: nobody can cancel any more, sit out the delay
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
            }
        }

        if state_for_thread
            .compare_exchange(PENDING, FIRED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            task();
        } else {
            tracing::debug!(op = "timer.cancelled", "Scheduled task cancelled");
        }
    });

    TimerHandle {
        wake_tx,
        state,
        thread: Some(thread),
    }
}

impl TimerHandle {
    /// Cancel the task if it has not fired yet
    ///
    /// Returns true when this call prevented the task from running.
    pub fn cancel(&self) -> bool {
        let cancelled = self
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if cancelled {
            let _ = self.wake_tx.send(());
        }
        cancelled
    }

    /// Whether the task has started running
    pub fn has_fired(&self) -> bool {
        self.state.load(Ordering::SeqCst) == FIRED
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::SeqCst) == CANCELLED
    }

    /// Block until the task has fired or was cancelled
    ///
    /// Returns true if the task ran to completion; a panicking task counts
    /// as not run.
    pub fn wait(mut self) -> bool {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!(op = "timer.task_panicked", "Scheduled task panicked");
                return false;
            }
        }
        self.has_fired()
    }
}
