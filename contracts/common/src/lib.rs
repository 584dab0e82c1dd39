//! Token Locker Common Library
//!
//! Shared types, constants, and utilities for the token locker contracts.
//!
//! ## What Lives Here
//!
//! - **Positions**: Per-account locked balance records and the ledger state
//! - **Fixed-Point Math**: Underlying <-> credit conversions at a 1e18 exchange rate
//! - **Token Ledger**: The underlying asset (balances, allowances, transfers)
//! - **Savings Vault Interface**: What the locker expects from the yield source
//! - **Reentrancy Guard**: Exclusive-access discipline for state-mutating calls
//! - **Events**: Typed, borsh-encodable records of every state change
//!
//! This crate is `no_std` compatible for WASM compilation when built
//! without the default `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export collections for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::{collections::BTreeMap, rc::Rc, vec::Vec};
#[cfg(feature = "std")]
pub use std::{collections::BTreeMap, rc::Rc, vec::Vec};

pub mod constants;
pub mod errors;
pub mod types;
pub mod math;
pub mod events;
pub mod token_ops;
pub mod savings;
pub mod guard;


// Re-exports for convenience
pub use constants::*;
pub use errors::*;
pub use types::*;
pub use math::*;
pub use events::*;
pub use token_ops::*;
pub use savings::*;
pub use guard::*;
