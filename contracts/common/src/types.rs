//! Core Types for the Token Locker
//!
//! This module defines the data structures shared by the locker, the
//! savings vault and the host adapter.

use crate::{BTreeMap, Vec};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Type alias for addresses (32-byte hash)
pub type Address = [u8; 32];

/// Type alias for app identifiers
pub type AppId = [u8; 32];

// ============ Call Context ============

/// Who is calling and when. Supplied by the host for every entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// Account invoking the operation
    pub caller: Address,
    /// Current time in seconds
    pub timestamp: u64,
}

impl CallContext {
    pub fn new(caller: Address, timestamp: u64) -> Self {
        Self { caller, timestamp }
    }
}

// ============ Position Types ============

/// Locked position of a single account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Position {
    /// Underlying units locked (cumulative until withdrawal)
    pub amount: u64,
    /// Credit units attributed to this position
    pub credits: u64,
    /// Time after which withdrawal is permitted
    pub unlock_time: u64,
    /// Underlying has actually been deposited into the vault
    pub locked: bool,
    /// Account has ever locked (present in the account index)
    pub registered: bool,
}

impl Position {
    /// Returns true if there is nothing to redeem
    pub fn is_empty(&self) -> bool {
        self.amount == 0 || self.credits == 0
    }

    /// Returns true if the lock has expired at `now`
    pub fn is_expired(&self, now: u64) -> bool {
        self.unlock_time <= now
    }
}

// ============ Locker Config ============

/// Immutable locker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct LockerConfig {
    /// The locker's own account in the underlying ledger
    pub locker: Address,
    /// Underlying token app_id
    pub underlying: AppId,
    /// Savings vault account
    pub savings_vault: Address,
    /// Admin address (batch mode controls)
    pub admin: Address,
    /// Lockup applied to fresh locks, in seconds
    pub lockup_duration: u64,
}

impl LockerConfig {
    /// Config with the protocol lockup duration
    pub fn new(locker: Address, underlying: AppId, savings_vault: Address, admin: Address) -> Self {
        Self {
            locker,
            underlying,
            savings_vault,
            admin,
            lockup_duration: crate::constants::locker::LOCKUP_DURATION,
        }
    }
}

// ============ Locker State ============

/// Persisted ledger state: the position store plus aggregates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct LockerState {
    /// Positions keyed by account
    pub positions: BTreeMap<Address, Position>,
    /// Accounts in first-lock order; append-only
    pub account_index: Vec<Address>,
    /// Deferred-deposit mode
    pub batch_enabled: bool,
    /// Un-deposited balance required for a sweep
    pub batch_threshold: u64,
    /// Sum of all position amounts
    pub total_locked: u64,
    /// Sum of all position credits
    pub total_credits: u64,
    /// Credits actually held in the vault on behalf of the locker
    pub vault_credits: u64,
}

impl Default for LockerState {
    fn default() -> Self {
        Self::new()
    }
}

impl LockerState {
    /// Creates initial locker state (immediate mode, default threshold)
    pub fn new() -> Self {
        Self {
            positions: BTreeMap::new(),
            account_index: Vec::new(),
            batch_enabled: false,
            batch_threshold: crate::constants::locker::DEFAULT_BATCH_THRESHOLD,
            total_locked: 0,
            total_credits: 0,
            vault_credits: 0,
        }
    }

    /// Position for `account`, or an empty one if it never locked
    pub fn position(&self, account: &Address) -> Position {
        self.positions.get(account).copied().unwrap_or_default()
    }

    /// Difference between credits held in the vault and credits attributed
    /// to positions. Non-zero only when batch quotes and sweeps disagree.
    pub fn credit_drift(&self) -> i128 {
        self.vault_credits as i128 - self.total_credits as i128
    }

    /// SHA-256 digest of the canonical borsh encoding
    pub fn commitment(&self) -> [u8; 32] {
        use sha2::{Digest, Sha256};
        let bytes = borsh::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let result = hasher.finalize();
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&result);
        digest
    }
}

// ============ Action Types ============

/// Actions for the Token Locker contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum LockerAction {
    /// Lock underlying for the caller
    Lock { amount: u64 },
    /// Lock underlying on behalf of another account
    LockFor { beneficiary: Address, amount: u64 },
    /// Withdraw the caller's expired position
    Withdraw,
    /// Sweep pending underlying into the vault
    BatchExecute,
    /// Toggle batch mode (admin)
    SetBatchEnable { enabled: bool },
    /// Change the sweep threshold (admin)
    SetBatchThreshold { threshold: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_position_is_empty() {
        let state = LockerState::new();
        let position = state.position(&[7u8; 32]);
        assert!(position.is_empty());
        assert!(!position.registered);
        assert!(!position.locked);
    }

    #[test]
    fn test_position_without_credits_is_empty() {
        let position = Position {
            amount: 5,
            credits: 0,
            ..Position::default()
        };
        assert!(position.is_empty());
        assert!(!Position { credits: 51, ..position }.is_empty());
    }

    #[test]
    fn test_position_expiry_is_inclusive() {
        let position = Position { unlock_time: 100, ..Position::default() };
        assert!(!position.is_expired(99));
        assert!(position.is_expired(100));
    }

    #[test]
    fn test_credit_drift_sign() {
        let mut state = LockerState::new();
        state.total_credits = 1_000;
        state.vault_credits = 990;
        assert_eq!(state.credit_drift(), -10);
    }

    #[test]
    fn test_commitment_tracks_state() {
        let mut state = LockerState::new();
        let before = state.commitment();
        assert_eq!(before, LockerState::new().commitment());

        state.total_locked = 1;
        assert_ne!(before, state.commitment());
    }
}
