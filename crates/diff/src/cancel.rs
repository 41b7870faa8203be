use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::ComparisonError;

/// Shared flag a running comparison polls to find out it should stop
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once the token fired
    pub fn check(&self) -> Result<(), ComparisonError> {
        if self.is_cancelled() {
            Err(ComparisonError::Cancelled)
        } else {
            Ok(())
        }
    }
}
