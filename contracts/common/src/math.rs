//! Mathematical Utilities for the Token Locker
//!
//! Fixed-point conversions between underlying units and credits.
//! Exchange rates are underlying-per-credit scaled by 1e18.

use crate::constants::precision::FULL_SCALE;
use crate::errors::{LockerError, LockerResult};

/// Convert underlying to credits at `exchange_rate`
///
/// credits = underlying * 1e18 / rate + 1
///
/// The extra credit rounds in the depositor's favour so that redeeming
/// the issued credits never returns less than was deposited.
pub fn underlying_to_credits(underlying: u64, exchange_rate: u128) -> LockerResult<u64> {
    if exchange_rate == 0 {
        return Err(LockerError::DivisionByZero);
    }

    let credits = (underlying as u128)
        .checked_mul(FULL_SCALE)
        .ok_or(LockerError::Overflow)?
        .checked_div(exchange_rate)
        .ok_or(LockerError::DivisionByZero)?
        .checked_add(1)
        .ok_or(LockerError::Overflow)?;

    u64::try_from(credits).map_err(|_| LockerError::Overflow)
}

/// Convert credits to underlying at `exchange_rate`, rounding down
///
/// underlying = credits * rate / 1e18
pub fn credits_to_underlying(credits: u64, exchange_rate: u128) -> LockerResult<u64> {
    let underlying = (credits as u128)
        .checked_mul(exchange_rate)
        .ok_or(LockerError::Overflow)?
        .checked_div(FULL_SCALE)
        .ok_or(LockerError::DivisionByZero)?;

    u64::try_from(underlying).map_err(|_| LockerError::Overflow)
}

/// Exchange rate implied by a vault's totals
///
/// rate = total_savings * 1e18 / total_credits
pub fn calculate_exchange_rate(total_savings: u64, total_credits: u64) -> LockerResult<u128> {
    (total_savings as u128)
        .checked_mul(FULL_SCALE)
        .ok_or(LockerError::Overflow)?
        .checked_div(total_credits as u128)
        .ok_or(LockerError::DivisionByZero)
}
