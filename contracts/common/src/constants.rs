//! Protocol Constants
//!
//! All magic numbers and configuration values for the token locker.
//!
//! # Network Configuration
//!
//! Use feature flags to compile for different networks:
//! - `mainnet` - Production values (larger batch threshold)
//! - Default (no feature) - Testnet values (small threshold for testing)
//!
//! ```toml
//! # For mainnet deployment:
//! locker-common = { path = "...", features = ["mainnet"] }
//! ```

/// Underlying Token Metadata
pub mod token {
    /// One unit with decimals (1 token = 100_000_000 base units)
    pub const ONE: u64 = 100_000_000;
}

/// Time-related constants (seconds)
pub mod time {
    /// Seconds per day
    pub const ONE_DAY: u64 = 86_400;
}

/// Precision constants
pub mod precision {
    /// Fixed-point scale for exchange rates (1e18 = 1.0)
    pub const FULL_SCALE: u128 = 1_000_000_000_000_000_000;
}

/// Savings Vault Configuration
pub mod vault {
    /// Exchange rate a fresh vault starts at (0.1 underlying per credit,
    /// i.e. 1 underlying = 10 credits)
    pub const INITIAL_EXCHANGE_RATE: u128 = super::precision::FULL_SCALE / 10;
}

/// Locker Configuration
pub mod locker {
    use super::{time::ONE_DAY, token::ONE};

    /// Lockup duration applied to fresh locks (~6 months)
    pub const LOCKUP_DURATION: u64 = 180 * ONE_DAY;

    /// Default un-deposited balance needed before a batch sweep may run
    /// - Mainnet: 10,000 tokens (amortizes the vault deposit)
    /// - Testnet: 100 tokens (allows testing with faucet funds)
    #[cfg(feature = "mainnet")]
    pub const DEFAULT_BATCH_THRESHOLD: u64 = 10_000 * ONE;
    #[cfg(not(feature = "mainnet"))]
    pub const DEFAULT_BATCH_THRESHOLD: u64 = 100 * ONE;
}

/// The null address (rejected as a beneficiary)
pub const ZERO_ADDRESS: [u8; 32] = [0u8; 32];
