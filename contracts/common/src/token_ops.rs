//! Token Operations Module
//!
//! Ledger for the underlying asset: balances, allowances and transfers.
//! The locker pulls deposits with `transfer_from`, the savings vault pulls
//! from the locker the same way, so both hold the same ledger through a
//! [`SharedLedger`] handle.
//!
//! ## Key Features
//!
//! - **Allowances**: `transfer_from` spends an approval; `u64::MAX` is unlimited
//! - **Atomic Transfers**: A failed transfer leaves every balance untouched
//! - **Supply Tracking**: Minting increases total supply

use core::cell::RefCell;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::AmountErrorReason;
use crate::types::Address;
use crate::{BTreeMap, LockerError, LockerResult, Rc};

/// Allowance value that is never decremented
pub const UNLIMITED_ALLOWANCE: u64 = u64::MAX;

/// Ledger shared between the locker, the vault and the host
pub type SharedLedger = Rc<RefCell<TokenLedger>>;

/// Underlying asset ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TokenLedger {
    /// Balance per account
    balances: BTreeMap<Address, u64>,
    /// owner -> spender -> remaining allowance
    allowances: BTreeMap<Address, BTreeMap<Address, u64>>,
    /// Total supply
    total_supply: u64,
}

impl TokenLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the ledger in a shared handle
    pub fn shared(self) -> SharedLedger {
        Rc::new(RefCell::new(self))
    }

    /// Balance of `account`
    pub fn balance_of(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Remaining allowance `owner` granted to `spender`
    pub fn allowance(&self, owner: &Address, spender: &Address) -> u64 {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Total supply of the asset
    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    /// Create new units for `to` (faucet / bridge in)
    pub fn mint(&mut self, to: Address, amount: u64) -> LockerResult<()> {
        if amount == 0 {
            return Err(LockerError::InvalidAmount {
                amount,
                reason: AmountErrorReason::Zero,
            });
        }

        let new_supply = self.total_supply
            .checked_add(amount)
            .ok_or(LockerError::Overflow)?;
        let new_balance = self.balance_of(&to)
            .checked_add(amount)
            .ok_or(LockerError::Overflow)?;

        self.total_supply = new_supply;
        self.balances.insert(to, new_balance);
        Ok(())
    }

    /// Set the allowance `owner` grants to `spender`
    pub fn approve(&mut self, owner: Address, spender: Address, amount: u64) {
        self.allowances.entry(owner).or_default().insert(spender, amount);
    }

    /// Move `amount` from `from` to `to`
    pub fn transfer(&mut self, from: Address, to: Address, amount: u64) -> LockerResult<()> {
        let available = self.balance_of(&from);
        if available < amount {
            return Err(LockerError::InsufficientBalance {
                available,
                requested: amount,
            });
        }

        if from == to || amount == 0 {
            return Ok(());
        }

        let new_to = self.balance_of(&to)
            .checked_add(amount)
            .ok_or(LockerError::Overflow)?;

        self.balances.insert(from, available - amount);
        self.balances.insert(to, new_to);
        Ok(())
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: u64,
    ) -> LockerResult<()> {
        let allowance = self.allowance(&from, &spender);
        if allowance < amount {
            return Err(LockerError::InsufficientAllowance {
                owner: from,
                spender,
                allowance,
                requested: amount,
            });
        }

        self.transfer(from, to, amount)?;

        if allowance != UNLIMITED_ALLOWANCE {
            self.approve(from, spender, allowance - amount);
        }
        Ok(())
    }
}
