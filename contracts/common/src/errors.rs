//! Error Types for the Token Locker
//!
//! Every rejection is an expected outcome reported synchronously to the
//! caller. None of them are fatal: the operation is aborted and state is
//! left exactly as it was before the call.

use crate::types::Address;

/// Result type alias for locker operations
pub type LockerResult<T> = Result<T, LockerError>;

/// Main error enum for all locker, vault and token errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockerError {
    // ============ Amount Errors ============
    /// Invalid amount provided
    InvalidAmount { amount: u64, reason: AmountErrorReason },

    /// Insufficient underlying balance for a transfer
    InsufficientBalance { available: u64, requested: u64 },

    /// Spender is not approved for the requested amount
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        allowance: u64,
        requested: u64,
    },

    /// Not enough credits to redeem
    InsufficientCredits { available: u64, requested: u64 },

    // ============ Lock Errors ============
    /// Beneficiary is the null address
    InvalidBeneficiary,

    /// Computed unlock time is not strictly in the future
    LockTimeNotFuture { unlock_time: u64, now: u64 },

    // ============ Batch Errors ============
    /// Batch mode is switched off
    BatchDisabled,

    /// Un-deposited balance is under the batch threshold
    BelowThreshold { available: u64, threshold: u64 },

    // ============ Withdrawal Errors ============
    /// Position has no amount or no credits
    NothingToWithdraw,

    /// Lock has not expired yet
    LockNotExpired { unlock_time: u64, now: u64 },

    /// Position is still waiting for a batch sweep
    NotYetLocked,

    // ============ Access Errors ============
    /// A guarded operation was entered while another one is in progress
    ReentrancyDetected,

    /// Only the locker admin can perform this action
    AdminOnly,

    /// Caller is not authorized for this operation
    Unauthorized { expected: Address, actual: Address },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    Overflow,

    /// Arithmetic underflow occurred
    Underflow,

    /// Division by zero
    DivisionByZero,

    /// Exchange rate is zero or would decrease
    InvalidExchangeRate { current: u128, proposed: u128 },

    // ============ State Errors ============
    /// Invalid state transition
    InvalidStateTransition,

    /// Invalid input parameter
    InvalidInput { param: &'static str, reason: &'static str },
}

/// Reasons for amount-related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountErrorReason {
    /// Amount is zero when non-zero required
    Zero,
}

impl LockerError {
    /// Returns a human-readable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "E010_INVALID_AMOUNT",
            Self::InsufficientBalance { .. } => "E011_INSUFFICIENT_BALANCE",
            Self::InsufficientAllowance { .. } => "E012_INSUFFICIENT_ALLOWANCE",
            Self::InsufficientCredits { .. } => "E013_INSUFFICIENT_CREDITS",
            Self::InvalidBeneficiary => "E020_INVALID_BENEFICIARY",
            Self::LockTimeNotFuture { .. } => "E021_LOCK_TIME_NOT_FUTURE",
            Self::BatchDisabled => "E030_BATCH_DISABLED",
            Self::BelowThreshold { .. } => "E031_BELOW_THRESHOLD",
            Self::NothingToWithdraw => "E040_NOTHING_TO_WITHDRAW",
            Self::LockNotExpired { .. } => "E041_LOCK_NOT_EXPIRED",
            Self::NotYetLocked => "E042_NOT_YET_LOCKED",
            Self::ReentrancyDetected => "E050_REENTRANCY",
            Self::AdminOnly => "E051_ADMIN_ONLY",
            Self::Unauthorized { .. } => "E052_UNAUTHORIZED",
            Self::Overflow => "E080_OVERFLOW",
            Self::Underflow => "E081_UNDERFLOW",
            Self::DivisionByZero => "E082_DIV_ZERO",
            Self::InvalidExchangeRate { .. } => "E083_INVALID_RATE",
            Self::InvalidStateTransition => "E101_INVALID_STATE",
            Self::InvalidInput { .. } => "E090_INVALID_INPUT",
        }
    }

    /// Returns true if this error is recoverable (user can fix it)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InsufficientBalance { .. } => true,   // Get more funds
            Self::InsufficientAllowance { .. } => true, // Approve the locker
            Self::BelowThreshold { .. } => true,        // Wait for more deposits
            Self::LockNotExpired { .. } => true,        // Wait for unlock
            Self::NotYetLocked => true,                 // Wait for a sweep
            _ => false,
        }
    }
}
