//! Stop request shared between the read loop, builtins and signal adapters.
use std::sync::{
    atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering},
    Arc,
};

#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    requested: Arc<AtomicBool>,
    exit_code: Arc<AtomicI32>,
    // Written from a signal handler with the signal number.
    signal: Arc<AtomicUsize>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the shell to stop after the current stage with `code`.
    pub fn cancel(&self, code: i32) {
        self.exit_code.store(code, Ordering::SeqCst);
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.requested.load(Ordering::SeqCst) || self.signal.load(Ordering::SeqCst) != 0
    }

    /// `128 + signal` when a signal asked for the stop.
    pub fn exit_code(&self) -> i32 {
        if self.requested.load(Ordering::SeqCst) {
            return self.exit_code.load(Ordering::SeqCst);
        }
        match self.signal.load(Ordering::SeqCst) {
            0 => 0,
            sig => 128 + sig as i32,
        }
    }

    /// Slot for `signal_hook::flag::register_usize`.
    pub fn signal_slot(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.signal)
    }
}
