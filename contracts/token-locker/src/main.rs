//! Token Locker - Charms App Entry Point
//!
//! Validates locker state transitions on Bitcoin using client-side
//! validation.
//!
//! ## What This App Validates
//!
//! - **Initialize**: A fresh locker state charm signed by the admin
//! - **Lock**: Underlying moves into a time-locked position
//! - **Withdraw**: An expired, swept position pays out principal plus yield
//! - **BatchExecute**: Pending underlying is swept into the savings vault
//! - **SetBatchEnable / SetBatchThreshold**: Admin configuration
//!
//! The spell's output state must equal the input state with the
//! witnessed operation applied.

use charms_sdk::data::{App, Data, Transaction};

/// Main validation function for locker operations.
///
/// # Arguments
/// * `app` - The locker app definition
/// * `tx` - The transaction being validated
/// * `x` - Public inputs
/// * `w` - Witness data (operation details)
///
/// # Returns
/// `true` if the operation is valid, `false` otherwise
pub fn app_contract(app: &App, tx: &Transaction, x: &Data, w: &Data) -> bool {
    token_locker::charms::validate_locker_operation(app, tx, x, w)
}

// Use the Charms SDK main macro to generate the entry point
charms_sdk::main!(app_contract);
