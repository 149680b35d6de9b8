//! Ctrl+C coordination for long-running commands.
//!
//! The execution-log watch and a blocking Common Crawl search poll the server
//! until interrupted, and downloads stream until complete. A shared
//! [`ShutdownCoordinator`] lets each of them notice Ctrl+C, clean up (stop
//! watching, delete the search input, discard a partial file) and return.

use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Shared handle to a shutdown coordinator.
pub type SharedShutdown = Arc<ShutdownCoordinator>;

static GLOBAL_SHUTDOWN: OnceCell<SharedShutdown> = OnceCell::new();

/// Register the process-wide handle so the transfer layer can discover it.
pub fn set_global_shutdown(handle: SharedShutdown) {
    let _ = GLOBAL_SHUTDOWN.set(handle);
}

/// Retrieve the registered handle, if the binary installed one.
pub fn get_global_shutdown() -> Option<SharedShutdown> {
    GLOBAL_SHUTDOWN.get().cloned()
}

/// Whether a registered handle has seen Ctrl+C.
pub fn global_shutdown_requested() -> bool {
    GLOBAL_SHUTDOWN
        .get()
        .is_some_and(|handle| handle.is_shutdown_requested())
}

/// Coordinates graceful shutdown across async tasks.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    is_shutdown: AtomicBool,
    notify: Notify,
}

impl ShutdownCoordinator {
    /// Create a new coordinator.
    pub fn new() -> Self {
        Self {
            is_shutdown: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Create a new shared coordinator wrapped in [`Arc`].
    pub fn shared() -> SharedShutdown {
        Arc::new(Self::new())
    }

    /// Request shutdown. Notifies all registered waiters exactly once.
    pub fn request_shutdown(&self) {
        if !self.is_shutdown.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.is_shutdown.load(Ordering::SeqCst)
    }

    /// Wait until shutdown is requested. Returns immediately if already set.
    pub async fn wait_for_shutdown(&self) {
        let notified = self.notify.notified();
        if self.is_shutdown_requested() {
            return;
        }
        notified.await;
    }

    /// Sleep for one poll interval.
    ///
    /// Returns `false` if shutdown was requested before or during the sleep.
    pub async fn sleep(&self, interval: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(interval) => !self.is_shutdown_requested(),
            _ = self.wait_for_shutdown() => false,
        }
    }
}
