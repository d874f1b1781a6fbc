// ============================================================
// Layer 6 — Interrupt Flag
// ============================================================
// Ctrl-C sets a shared flag instead of killing the process.
// The training loop polls it between batches and the epoch
// driver between epochs; both fall through to the final test
// evaluation when it is set. A second Ctrl-C while the flag is
// already set ends the process with exit code 130.

use anyhow::{Context, Result};

/// Conventional exit status for a process ended by SIGINT.
pub const ABORT_EXIT_CODE: i32 = 130;

/// What the Ctrl-C handler should do with one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// First signal: let the run wind down.
    Stop,
    /// Repeated signal: leave immediately.
    Abort,
}
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    flag: Arc<AtomicBool>,
}

impl InterruptFlag {
    /// A flag that no signal handler is attached to.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a flag and route Ctrl-C to it. Can only be called once
    /// per process.
    pub fn install() -> Result<Self> {
        let interrupt = Self::new();
        let handle    = interrupt.clone();
        ctrlc::set_handler(move || {
            if handle.on_signal() == SignalAction::Abort {
                eprintln!("Second interrupt, aborting");
                std::process::exit(ABORT_EXIT_CODE);
            }
            eprintln!("Interrupt received; finishing the current batch (Ctrl-C again to abort)");
        })
        .context("Cannot install Ctrl-C handler")?;
        Ok(interrupt)
    }

    /// Raise the flag, reporting whether it was already raised.
    pub fn on_signal(&self) -> SignalAction {
        if self.flag.swap(true, Ordering::SeqCst) {
            SignalAction::Abort
        } else {
            SignalAction::Stop
        }
    }

    #[cfg(test)]
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let a = InterruptFlag::new();
        let b = a.clone();
        assert!(!b.is_set());
        a.trigger();
        assert!(b.is_set());
    }

    #[test]
    fn test_second_signal_aborts() {
        let flag = InterruptFlag::new();
        assert_eq!(flag.on_signal(), SignalAction::Stop);
        assert!(flag.is_set());
        assert_eq!(flag.clone().on_signal(), SignalAction::Abort);
    }

    #[test]
    fn test_signal_after_programmatic_trigger_aborts() {
        let flag = InterruptFlag::new();
        flag.trigger();
        assert_eq!(flag.on_signal(), SignalAction::Abort);
    }
}
