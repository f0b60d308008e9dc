//! A Ctrl-C latch shared between the signal watcher and the running command.
//!
//! Children spawned by the [`SystemRunner`](crate::SystemRunner) receive the
//! terminal's SIGINT themselves. Commands that block in-process (`wait`) or
//! run several steps poll the latch between steps instead.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::CommandError;

/// Cloneable flag raised once when the user interrupts.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    /// A latch that has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an interrupt.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether the user has interrupted.
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Interrupted)` once the latch has fired.
    pub fn check(&self) -> Result<(), CommandError> {
        if self.is_raised() {
            Err(CommandError::Interrupted)
        } else {
            Ok(())
        }
    }
}
