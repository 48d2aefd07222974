//! Cooperative cancellation for long-running fits.
//!
//! A [`CancelToken`] is a cheap, clonable handle over an atomic flag. The
//! fit pipeline polls it between grid-refinement rounds and before the
//! final integration, so a cancelled fit stops at the next stage boundary
//! rather than mid-evaluation.
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Clonable cancellation handle shared between a fit and its controller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent; all clones observe the flag.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
