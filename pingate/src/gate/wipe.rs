//! Delayed, non-cancellable data wipe.
//!
//! Entering lockout schedules one task on the tokio runtime: it waits for the
//! configured delay, clears the whole store and hands control to the
//! `Terminator`. The caller only gets a `WipeTicket`, which can be awaited
//! but not aborted. Dropping the ticket leaves the task running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use crate::error::{PinGateError, Result};
use crate::storage::KeyValueStore;

/// Ends the application once its data is gone.
pub trait Terminator: Send + Sync + 'static {
    fn terminate(&self);
}

/// Exits the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitProcess {
    pub code: i32,
}

impl Terminator for ExitProcess {
    fn terminate(&self) {
        info!("Closing application");
        std::process::exit(self.code);
    }
}

/// Outcome of a completed wipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WipeReport {
    /// `false` if clearing the store failed. The process is terminated anyway.
    pub cleared: bool,
    pub wiped_at: DateTime<Utc>,
}

/// Awaitable handle on a scheduled wipe.
#[must_use = "the wipe runs regardless; await the ticket to observe it"]
#[derive(Debug)]
pub struct WipeTicket {
    rx: oneshot::Receiver<WipeReport>,
}

impl WipeTicket {
    /// Wait until the store has been cleared.
    ///
    /// Returns `None` if the task died before reporting.
    pub async fn wait(self) -> Option<WipeReport> {
        self.rx.await.ok()
    }
}

pub struct WipeScheduler {
    handle: Handle,
    delay: Duration,
    terminator: Arc<dyn Terminator>,
    fired: AtomicBool,
}

impl WipeScheduler {
    pub fn new(handle: Handle, delay: Duration, terminator: Arc<dyn Terminator>) -> Self {
        Self {
            handle,
            delay,
            terminator,
            fired: AtomicBool::new(false),
        }
    }

    /// Scheduler bound to the runtime the caller is running on.
    ///
    /// # Errors
    /// `Config` when called outside a tokio runtime.
    pub fn from_current(delay: Duration, terminator: Arc<dyn Terminator>) -> Result<Self> {
        let handle = Handle::try_current()
            .map_err(|e| PinGateError::Config(format!("No tokio runtime for wipe task: {}", e)))?;
        Ok(Self::new(handle, delay, terminator))
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Schedule the wipe of `store`. Only the first call schedules anything;
    /// later calls return `None`.
    pub fn schedule<S>(&self, store: Arc<S>) -> Option<WipeTicket>
    where
        S: KeyValueStore + ?Sized + 'static,
    {
        if self.fired.swap(true, Ordering::SeqCst) {
            warn!("Wipe already scheduled, ignoring");
            return None;
        }

        let (tx, rx) = oneshot::channel();
        let delay = self.delay;
        let terminator = self.terminator.clone();

        info!("Clearing data and closing application in {:?}", delay);
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;

            let cleared = match store.clear() {
                Ok(()) => {
                    info!("Application data cleared");
                    true
                }
                Err(e) => {
                    error!("Failed to clear application data: {}", e);
                    false
                }
            };

            // Nobody may be listening; the wipe is done either way.
            let _ = tx.send(WipeReport {
                cleared,
                wiped_at: Utc::now(),
            });

            terminator.terminate();
        });

        Some(WipeTicket { rx })
    }
}
