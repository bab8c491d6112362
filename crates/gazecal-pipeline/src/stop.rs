//! Cooperative cancellation contract for host-driven loops.
//!
//! Every controller that runs a frame loop implements [`Stoppable`]; hosts
//! cancel through the one method instead of probing for whichever cleanup
//! hooks happen to exist. The calibration core itself has no blocking
//! calls, so stop signals are checked between frames by the host.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Uniform cancellation capability.
pub trait Stoppable {
    /// Request the controller to stop at the next safe point.
    fn stop(&mut self);
}

/// Shared stop signal for a frame loop.
///
/// Clones share the same flag, so a signal handler or UI thread can hold
/// one handle while the loop polls another.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    flag: Arc<AtomicBool>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

impl Stoppable for StopFlag {
    fn stop(&mut self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}
