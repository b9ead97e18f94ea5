//! Cooperative cancellation.
//!
//! A [`CancelToken`] is cloned into the signal handler and the control loop.
//! The loop checks it between iterations and before the capture and
//! dispense phases; nothing is interrupted mid-actuation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
