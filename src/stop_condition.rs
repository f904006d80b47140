use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable flag telling the scan to stop dispatching work. Set from the
/// interrupt handler or by a worker that hit a fatal error.
#[derive(Clone, Debug, Default)]
pub struct StopCondition {
    should_stop: Arc<AtomicBool>,
}

impl StopCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_stop(&self) {
        self.should_stop.store(true, Ordering::SeqCst);
    }

    pub fn get_should_stop(&self) -> bool {
        self.should_stop.load(Ordering::SeqCst)
    }
}
