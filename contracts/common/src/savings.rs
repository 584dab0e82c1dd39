//! Savings Vault Interface
//!
//! The locker never touches the exchange rate or the aggregate credit
//! supply directly; it only consumes this trait. Implementations pull
//! underlying through the shared token ledger, so `deposit_savings`
//! requires the depositor to have approved the vault.
//!
//! `Clone` lets the locker checkpoint the vault and restore it when a
//! call fails part-way.

use crate::errors::LockerResult;
use crate::types::Address;

/// Yield source converting underlying into credits
pub trait SavingsVault: Clone {
    /// The vault's own account in the underlying ledger
    fn address(&self) -> Address;

    /// Pull `amount` underlying from `depositor` and mint credits to
    /// `beneficiary` at the current rate. Returns credits issued.
    fn deposit_savings(
        &mut self,
        depositor: Address,
        amount: u64,
        beneficiary: Address,
    ) -> LockerResult<u64>;

    /// Burn `credits` held by `redeemer` and send them the underlying at
    /// the current rate. Returns underlying paid out.
    fn redeem_credits(&mut self, redeemer: Address, credits: u64) -> LockerResult<u64>;

    /// Credits `amount` underlying would buy now (no state change)
    fn underlying_to_credits(&self, amount: u64) -> LockerResult<u64>;

    /// Underlying `credits` are worth now (no state change)
    fn credits_to_underlying(&self, credits: u64) -> LockerResult<u64>;

    /// Underlying per credit, scaled by 1e18
    fn exchange_rate(&self) -> u128;

    /// Credits held by `account`
    fn balance_of(&self, account: &Address) -> u64;

    /// Total credits in existence
    fn total_supply(&self) -> u64;
}
