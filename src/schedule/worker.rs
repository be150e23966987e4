//! Cooperative worker-thread plumbing shared by both schedulers.
//!
//! A scheduler owns one background worker while enabled. The worker blocks
//! on a condvar between polls so a stop request wakes it immediately, and
//! stopping blocks the caller until the worker has observably finished (with
//! a bounded wait), which is what lets callers rely on "no callback fires
//! after stop returns".

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};

/// Bounded wait applied when joining a stopping worker.
pub const WORKER_STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// Cancellation signal with an interruptible timed wait.
pub(crate) struct StopSignal {
    stopped: Mutex<bool>,
    condvar: Condvar,
}

impl StopSignal {
    fn new() -> Self {
        Self {
            stopped: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Whether a stop has been requested.
    pub(crate) fn is_stopped(&self) -> bool {
        *self.stopped.lock().unwrap()
    }

    /// Block for up to `timeout`, waking early on a stop request.
    ///
    /// Returns `true` when the worker should exit.
    pub(crate) fn wait(&self, timeout: Duration) -> bool {
        let guard = self.stopped.lock().unwrap();
        if *guard {
            return true;
        }
        let (guard, _) = self.condvar.wait_timeout(guard, timeout).unwrap();
        *guard
    }

    fn request_stop(&self) {
        *self.stopped.lock().unwrap() = true;
        self.condvar.notify_all();
    }
}

/// Handle to a running scheduler worker.
pub(crate) struct Worker {
    handle: JoinHandle<()>,
    done_rx: mpsc::Receiver<()>,
    signal: Arc<StopSignal>,
}

impl Worker {
    /// Spawn a named worker thread running `body` until it observes a stop.
    ///
    /// Spawn failure (resource exhaustion) is an ordinary error; callers
    /// degrade it to a failed enable rather than crashing.
    pub(crate) fn spawn<F>(name: &str, body: F) -> Result<Self>
    where
        F: FnOnce(Arc<StopSignal>) + Send + 'static,
    {
        let signal = Arc::new(StopSignal::new());
        let (done_tx, done_rx) = mpsc::channel();

        let worker_signal = signal.clone();
        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                body(worker_signal);
                let _ = done_tx.send(());
            })
            .with_context(|| format!("Failed to spawn {name} worker thread"))?;

        Ok(Self {
            handle,
            done_rx,
            signal,
        })
    }

    /// Request a stop and wait (bounded) for the worker to finish.
    ///
    /// Returns `true` when the worker observably stopped within the timeout.
    /// On timeout the thread is detached; its stop flag stays set so it can
    /// no longer invoke callbacks.
    pub(crate) fn stop(self, timeout: Duration) -> bool {
        self.signal.request_stop();
        match self.done_rx.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let _ = self.handle.join();
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
        }
    }
}
