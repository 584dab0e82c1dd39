//! Savings Vault Contract
//!
//! Yield source behind the token locker. Depositors hand over underlying
//! and receive credits; credits are redeemable for an ever-increasing
//! amount of underlying as interest is collected.
//!
//! ## Exchange Rate
//!
//! ```text
//! rate    = total_savings / total_credits      (scaled by 1e18)
//! credits = underlying / rate + 1
//! value   = credits * rate
//! ```
//!
//! The rate starts at 0.1 (1 underlying = 10 credits) and only moves
//! when interest is collected. It never decreases.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use locker_common::{
    constants::{vault::INITIAL_EXCHANGE_RATE, ZERO_ADDRESS},
    errors::{AmountErrorReason, LockerError, LockerResult},
    events::{EventLog, LockerEvent},
    math::{calculate_exchange_rate, credits_to_underlying, underlying_to_credits},
    savings::SavingsVault,
    token_ops::SharedLedger,
    types::Address,
};

// ============ Savings State ============

/// Persisted vault state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct SavingsState {
    /// Vault account in the underlying ledger
    pub address: Address,
    /// Only this account may deposit interest
    pub manager: Address,
    /// Underlying per credit, scaled by 1e18
    pub exchange_rate: u128,
    /// Underlying held for savers (principal + interest)
    pub total_savings: u64,
    /// Credits in existence
    pub total_credits: u64,
    /// Credits per holder
    pub credit_balances: BTreeMap<Address, u64>,
}

impl SavingsState {
    /// Creates initial vault state
    pub fn new(address: Address, manager: Address) -> Self {
        Self {
            address,
            manager,
            exchange_rate: INITIAL_EXCHANGE_RATE,
            total_savings: 0,
            total_credits: 0,
            credit_balances: BTreeMap::new(),
        }
    }
}

// ============ Savings Contract ============

/// In-memory savings vault operating on a shared underlying ledger
#[derive(Debug, Clone)]
pub struct SavingsContract {
    state: SavingsState,
    asset: SharedLedger,
    events: EventLog,
}

impl SavingsContract {
    /// Fresh vault at the initial exchange rate
    pub fn new(address: Address, manager: Address, asset: SharedLedger) -> Self {
        Self {
            state: SavingsState::new(address, manager),
            asset,
            events: EventLog::new(),
        }
    }

    /// Rebuild a vault from persisted state
    pub fn from_state(state: SavingsState, asset: SharedLedger) -> LockerResult<Self> {
        if state.exchange_rate == 0 {
            return Err(LockerError::InvalidExchangeRate {
                current: 0,
                proposed: 0,
            });
        }

        let credit_sum = state
            .credit_balances
            .values()
            .try_fold(0u64, |acc, credits| acc.checked_add(*credits))
            .ok_or(LockerError::Overflow)?;
        if credit_sum != state.total_credits {
            return Err(LockerError::InvalidStateTransition);
        }

        Ok(Self {
            state,
            asset,
            events: EventLog::new(),
        })
    }

    /// Current persisted state
    pub fn state(&self) -> &SavingsState {
        &self.state
    }

    /// Underlying held for savers
    pub fn total_savings(&self) -> u64 {
        self.state.total_savings
    }

    /// Underlying value of `account`'s credits at the current rate
    pub fn balance_of_underlying(&self, account: &Address) -> LockerResult<u64> {
        credits_to_underlying(self.balance_of(account), self.state.exchange_rate)
    }

    /// Events emitted so far
    pub fn events(&self) -> &[LockerEvent] {
        self.events.events()
    }

    /// Take emitted events
    pub fn take_events(&mut self) -> Vec<LockerEvent> {
        self.events.take()
    }

    /// Add yield to the vault, raising the exchange rate.
    ///
    /// Pulls `amount` from the manager. With no credits outstanding the
    /// interest is held and the rate stays put.
    pub fn deposit_interest(&mut self, caller: Address, amount: u64) -> LockerResult<u128> {
        // 1. Only the manager can add interest
        if caller != self.state.manager {
            return Err(LockerError::Unauthorized {
                expected: self.state.manager,
                actual: caller,
            });
        }

        // 2. Amount must be positive
        if amount == 0 {
            return Err(LockerError::InvalidAmount {
                amount,
                reason: AmountErrorReason::Zero,
            });
        }

        // 3. Compute new totals before moving funds
        let new_savings = self.state.total_savings
            .checked_add(amount)
            .ok_or(LockerError::Overflow)?;

        let old_rate = self.state.exchange_rate;
        let new_rate = if self.state.total_credits > 0 {
            calculate_exchange_rate(new_savings, self.state.total_credits)?.max(old_rate)
        } else {
            old_rate
        };

        // 4. Pull the interest
        self.asset
            .borrow_mut()
            .transfer_from(self.state.address, caller, self.state.address, amount)?;

        // 5. Apply
        self.state.total_savings = new_savings;
        self.state.exchange_rate = new_rate;

        self.events.emit(LockerEvent::InterestCollected {
            amount,
            old_rate,
            new_rate,
        });

        Ok(new_rate)
    }
}

impl SavingsVault for SavingsContract {
    fn address(&self) -> Address {
        self.state.address
    }

    fn deposit_savings(
        &mut self,
        depositor: Address,
        amount: u64,
        beneficiary: Address,
    ) -> LockerResult<u64> {
        // 1. Amount must be positive
        if amount == 0 {
            return Err(LockerError::InvalidAmount {
                amount,
                reason: AmountErrorReason::Zero,
            });
        }

        // 2. Credits must land somewhere
        if beneficiary == ZERO_ADDRESS {
            return Err(LockerError::InvalidBeneficiary);
        }

        // 3. Quote and new totals
        let credits = underlying_to_credits(amount, self.state.exchange_rate)?;
        let new_savings = self.state.total_savings
            .checked_add(amount)
            .ok_or(LockerError::Overflow)?;
        let new_total_credits = self.state.total_credits
            .checked_add(credits)
            .ok_or(LockerError::Overflow)?;
        let new_balance = self.balance_of(&beneficiary)
            .checked_add(credits)
            .ok_or(LockerError::Overflow)?;

        // 4. Pull the underlying (depositor must have approved the vault)
        self.asset
            .borrow_mut()
            .transfer_from(self.state.address, depositor, self.state.address, amount)?;

        // 5. Mint credits
        self.state.total_savings = new_savings;
        self.state.total_credits = new_total_credits;
        self.state.credit_balances.insert(beneficiary, new_balance);

        self.events.emit(LockerEvent::SavingsDeposited {
            depositor,
            beneficiary,
            underlying: amount,
            credits,
            exchange_rate: self.state.exchange_rate,
        });

        Ok(credits)
    }

    fn redeem_credits(&mut self, redeemer: Address, credits: u64) -> LockerResult<u64> {
        // 1. Credits must be positive
        if credits == 0 {
            return Err(LockerError::InvalidAmount {
                amount: credits,
                reason: AmountErrorReason::Zero,
            });
        }

        // 2. Redeemer must hold the credits
        let available = self.balance_of(&redeemer);
        if available < credits {
            return Err(LockerError::InsufficientCredits {
                available,
                requested: credits,
            });
        }

        // 3. Value at the current rate
        let underlying = credits_to_underlying(credits, self.state.exchange_rate)?;
        if underlying > self.state.total_savings {
            return Err(LockerError::InsufficientBalance {
                available: self.state.total_savings,
                requested: underlying,
            });
        }

        // 4. Pay out
        self.asset
            .borrow_mut()
            .transfer(self.state.address, redeemer, underlying)?;

        // 5. Burn credits
        self.state.total_savings -= underlying;
        self.state.total_credits -= credits;
        self.state.credit_balances.insert(redeemer, available - credits);

        self.events.emit(LockerEvent::CreditsRedeemed {
            redeemer,
            credits,
            underlying,
            exchange_rate: self.state.exchange_rate,
        });

        Ok(underlying)
    }

    fn underlying_to_credits(&self, amount: u64) -> LockerResult<u64> {
        underlying_to_credits(amount, self.state.exchange_rate)
    }

    fn credits_to_underlying(&self, credits: u64) -> LockerResult<u64> {
        credits_to_underlying(credits, self.state.exchange_rate)
    }

    fn exchange_rate(&self) -> u128 {
        self.state.exchange_rate
    }

    fn balance_of(&self, account: &Address) -> u64 {
        self.state.credit_balances.get(account).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> u64 {
        self.state.total_credits
    }
}

// ============ Tests ============
