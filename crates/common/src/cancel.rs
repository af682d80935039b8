//! Cooperative cancellation for a generation request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{DraftError, DraftResult};

/// Shared flag that a host sets to abandon the current request.
///
/// Stages never observe it mid-computation; it is polled at stage
/// boundaries and while waiting on asset probes.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Fail with [`DraftError::Cancelled`] if the flag is set.
    pub fn check(&self, stage: &str) -> DraftResult<()> {
        if self.is_cancelled() {
            tracing::info!(stage, "Generation cancelled");
            return Err(DraftError::cancelled(stage));
        }
        Ok(())
    }
}
