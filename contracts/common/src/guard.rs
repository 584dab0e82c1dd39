//! Reentrancy Guard
//!
//! Every state-mutating entry point of the locker runs inside a guard.
//! External collaborators may call back into the locker while an
//! operation is in progress; such nested calls are rejected before they
//! read or write any state.

use core::cell::Cell;

use crate::errors::{LockerError, LockerResult};

/// Single-flag guard owned by one ledger instance
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: Cell<bool>,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the guarded section as entered. The returned token releases
    /// the guard when dropped, on success and error paths alike.
    pub fn enter(&self) -> LockerResult<Entered<'_>> {
        if self.entered.replace(true) {
            return Err(LockerError::ReentrancyDetected);
        }
        Ok(Entered { guard: self })
    }

    /// Returns true while a guarded operation is running
    pub fn is_entered(&self) -> bool {
        self.entered.get()
    }
}

/// Proof that the guard is held
#[derive(Debug)]
pub struct Entered<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        self.guard.entered.set(false);
    }
}
