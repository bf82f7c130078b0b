//! Cooperative cancellation for record streams.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::info;

/// Shared flag checked by [`crate::stream::RecordStream`] between records.
///
/// Clones share the same flag, so a handle can be moved to another thread
/// and cancelled from there.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Cancel this token once `limit` has elapsed.
    pub fn cancel_after(&self, limit: Duration) -> thread::JoinHandle<()> {
        let token = self.clone();
        thread::spawn(move || {
            thread::sleep(limit);
            if !token.is_cancelled() {
                info!(limit = %humantime::format_duration(limit), "time limit reached, cancelling");
                token.cancel();
            }
        })
    }
}
