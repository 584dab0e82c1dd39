//! Token Locker Contract
//!
//! Time-locked savings positions on top of a savings vault.
//! Users lock underlying for a fixed lockup; the locker converts it into
//! yield-bearing vault credits and pays principal plus yield back out
//! once the lock expires.
//!
//! ## Deposit Modes
//!
//! - **Immediate**: every lock deposits the locker's pending underlying
//!   into the vault and the position is locked right away.
//! - **Batch**: locks only quote credits at the current rate; underlying
//!   accumulates until `batch_execute` sweeps it into the vault in one
//!   deposit and locks every waiting position.
//!
//! ## Execution Model
//!
//! Entry points take `&self`: the vault and the underlying ledger are
//! shared collaborators that may call back into the locker. Every
//! state-mutating entry point holds the reentrancy guard and runs
//! atomically: on any error the locker state, the vault and the ledger
//! are restored to what they were before the call.

use std::cell::{Ref, RefCell};
use std::collections::BTreeSet;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

// Charms SDK integration (conditional compilation)
#[cfg(feature = "charms")]
pub mod charms;


use locker_common::{
    constants::ZERO_ADDRESS,
    errors::{AmountErrorReason, LockerError, LockerResult},
    events::{EventLog, LockerEvent},
    guard::ReentrancyGuard,
    savings::SavingsVault,
    token_ops::{SharedLedger, TokenLedger, UNLIMITED_ALLOWANCE},
    types::{Address, CallContext, LockerAction, LockerConfig, LockerState, Position},
};
use locker_savings_vault::{SavingsContract, SavingsState};

// ============ Snapshot ============

/// Everything a host persists between calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct LockerSnapshot {
    /// Locker config
    pub config: LockerConfig,
    /// Position store and aggregates
    pub state: LockerState,
    /// Savings vault state
    pub vault: SavingsState,
    /// Underlying ledger
    pub asset: TokenLedger,
}

// ============ Token Locker ============

/// The locked-position ledger
pub struct TokenLocker<V: SavingsVault> {
    config: LockerConfig,
    state: RefCell<LockerState>,
    asset: SharedLedger,
    vault: RefCell<V>,
    guard: ReentrancyGuard,
    events: RefCell<EventLog>,
}

impl<V: SavingsVault> TokenLocker<V> {
    /// Deploy a fresh locker and approve the vault to pull its underlying
    pub fn new(config: LockerConfig, asset: SharedLedger, vault: V) -> LockerResult<Self> {
        let locker = Self::from_parts(config, LockerState::new(), asset, vault)?;
        locker
            .asset
            .borrow_mut()
            .approve(locker.config.locker, locker.config.savings_vault, UNLIMITED_ALLOWANCE);
        Ok(locker)
    }

    /// Rebuild a locker from persisted parts
    pub fn from_parts(
        config: LockerConfig,
        state: LockerState,
        asset: SharedLedger,
        vault: V,
    ) -> LockerResult<Self> {
        if config.locker == ZERO_ADDRESS {
            return Err(LockerError::InvalidInput {
                param: "locker",
                reason: "locker account cannot be the zero address",
            });
        }
        if config.underlying == ZERO_ADDRESS {
            return Err(LockerError::InvalidInput {
                param: "underlying",
                reason: "underlying token id cannot be zero",
            });
        }
        if config.lockup_duration == 0 {
            return Err(LockerError::InvalidInput {
                param: "lockup_duration",
                reason: "lockup duration must be positive",
            });
        }
        if vault.address() != config.savings_vault {
            return Err(LockerError::InvalidInput {
                param: "savings_vault",
                reason: "vault address does not match config",
            });
        }
        check_invariants(&state)?;

        Ok(Self {
            config,
            state: RefCell::new(state),
            asset,
            vault: RefCell::new(vault),
            guard: ReentrancyGuard::new(),
            events: RefCell::new(EventLog::new()),
        })
    }

    // ============ Entry Points ============

    /// Dispatch an action
    pub fn execute(&self, ctx: &CallContext, action: &LockerAction) -> LockerResult<()> {
        match action {
            LockerAction::Lock { amount } => self.lock(ctx, *amount).map(|_| ()),
            LockerAction::LockFor { beneficiary, amount } => {
                self.lock_for(ctx, *beneficiary, *amount).map(|_| ())
            }
            LockerAction::Withdraw => self.withdraw(ctx),
            LockerAction::BatchExecute => self.batch_execute(ctx).map(|_| ()),
            LockerAction::SetBatchEnable { enabled } => self.set_batch_enable(ctx, *enabled),
            LockerAction::SetBatchThreshold { threshold } => {
                self.set_batch_threshold(ctx, *threshold)
            }
        }
    }

    /// Lock `amount` underlying for the caller. Returns credits issued by
    /// this call.
    pub fn lock(&self, ctx: &CallContext, amount: u64) -> LockerResult<u64> {
        self.lock_for(ctx, ctx.caller, amount)
    }

    /// Lock `amount` underlying paid by the caller into `beneficiary`'s
    /// position. Returns credits issued by this call.
    pub fn lock_for(&self, ctx: &CallContext, beneficiary: Address, amount: u64) -> LockerResult<u64> {
        let _entered = self.guard.enter()?;
        self.atomically(|| self.process_lock(ctx, beneficiary, amount))
    }

    /// Redeem the caller's expired position and pay out the underlying
    pub fn withdraw(&self, ctx: &CallContext) -> LockerResult<()> {
        let _entered = self.guard.enter()?;
        self.atomically(|| self.process_withdraw(ctx))
    }

    /// Sweep all pending underlying into the vault. Returns credits minted.
    pub fn batch_execute(&self, ctx: &CallContext) -> LockerResult<u64> {
        let _entered = self.guard.enter()?;
        self.atomically(|| self.process_batch(ctx))
    }

    /// Switch batch mode on or off (admin)
    pub fn set_batch_enable(&self, ctx: &CallContext, enabled: bool) -> LockerResult<()> {
        let _entered = self.guard.enter()?;
        self.ensure_admin(ctx)?;

        self.state.borrow_mut().batch_enabled = enabled;
        self.emit(LockerEvent::BatchModeChanged {
            enabled,
            by: ctx.caller,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    /// Change the pending balance required for a sweep (admin)
    pub fn set_batch_threshold(&self, ctx: &CallContext, threshold: u64) -> LockerResult<()> {
        let _entered = self.guard.enter()?;
        self.ensure_admin(ctx)?;

        if threshold == 0 {
            return Err(LockerError::InvalidAmount {
                amount: threshold,
                reason: AmountErrorReason::Zero,
            });
        }

        let old_threshold = {
            let mut state = self.state.borrow_mut();
            core::mem::replace(&mut state.batch_threshold, threshold)
        };
        self.emit(LockerEvent::BatchThresholdChanged {
            old_threshold,
            new_threshold: threshold,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    // ============ Operation Bodies ============

    fn process_lock(&self, ctx: &CallContext, beneficiary: Address, amount: u64) -> LockerResult<u64> {
        // 1. Amount must be positive
        if amount == 0 {
            return Err(LockerError::InvalidAmount {
                amount,
                reason: AmountErrorReason::Zero,
            });
        }

        // 2. Beneficiary must be a real account
        if beneficiary == ZERO_ADDRESS {
            return Err(LockerError::InvalidBeneficiary);
        }

        // 3. Pull the underlying before any state changes
        let locker = self.config.locker;
        self.asset
            .borrow_mut()
            .transfer_from(locker, ctx.caller, locker, amount)?;

        // 4. Route: quote only in batch mode, deposit now otherwise
        let batch_enabled = self.state.borrow().batch_enabled;
        let credits = if batch_enabled {
            self.vault.borrow().underlying_to_credits(amount)?
        } else {
            self.deposit_pending(amount)?
        };

        // 5. Update the position
        let unlock_time = {
            let mut state = self.state.borrow_mut();
            let mut position = state.position(&beneficiary);

            let unlock_time = next_unlock_time(&position, ctx.timestamp, self.config.lockup_duration)?;
            if unlock_time <= ctx.timestamp {
                return Err(LockerError::LockTimeNotFuture {
                    unlock_time,
                    now: ctx.timestamp,
                });
            }

            let new_amount = position.amount
                .checked_add(amount)
                .ok_or(LockerError::Overflow)?;
            let new_credits = position.credits
                .checked_add(credits)
                .ok_or(LockerError::Overflow)?;
            let total_locked = state.total_locked
                .checked_add(amount)
                .ok_or(LockerError::Overflow)?;
            let total_credits = state.total_credits
                .checked_add(credits)
                .ok_or(LockerError::Overflow)?;

            position.amount = new_amount;
            position.credits = new_credits;
            position.unlock_time = unlock_time;
            if !batch_enabled {
                position.locked = true;
            }
            if !position.registered {
                position.registered = true;
                state.account_index.push(beneficiary);
            }

            state.positions.insert(beneficiary, position);
            state.total_locked = total_locked;
            state.total_credits = total_credits;
            unlock_time
        };

        // 6. Emit event
        self.emit(LockerEvent::Locked {
            account: beneficiary,
            amount,
            credits,
            unlock_time,
            timestamp: ctx.timestamp,
        });

        Ok(credits)
    }

    /// Immediate-mode deposit of everything the locker holds.
    ///
    /// Underlying left over from batch mode rides along: its cohort is
    /// finalized and the caller is credited with the pre-deposit quote
    /// for `amount` only.
    fn deposit_pending(&self, amount: u64) -> LockerResult<u64> {
        let locker = self.config.locker;
        let pending = self.asset.borrow().balance_of(&locker);
        let quoted = self.vault.borrow().underlying_to_credits(amount)?;

        let issued = self.vault.borrow_mut().deposit_savings(locker, pending, locker)?;

        let mut state = self.state.borrow_mut();
        state.vault_credits = state.vault_credits
            .checked_add(issued)
            .ok_or(LockerError::Overflow)?;

        if pending == amount {
            return Ok(issued);
        }
        finalize_cohort(&mut state);
        Ok(quoted)
    }

    fn process_withdraw(&self, ctx: &CallContext) -> LockerResult<()> {
        let account = ctx.caller;
        let position = self.state.borrow().position(&account);

        // 1. Something must be locked
        if position.is_empty() {
            return Err(LockerError::NothingToWithdraw);
        }

        // 2. Lock must have expired
        if !position.is_expired(ctx.timestamp) {
            return Err(LockerError::LockNotExpired {
                unlock_time: position.unlock_time,
                now: ctx.timestamp,
            });
        }

        // 3. Underlying must actually be in the vault
        if !position.locked {
            return Err(LockerError::NotYetLocked);
        }

        // 4. Redeem the position's credits
        let locker = self.config.locker;
        let underlying = self.vault.borrow_mut().redeem_credits(locker, position.credits)?;

        // 5. Clear the position; flags and unlock time stay as residue
        {
            let mut state = self.state.borrow_mut();
            let total_locked = state.total_locked
                .checked_sub(position.amount)
                .ok_or(LockerError::Underflow)?;
            let total_credits = state.total_credits
                .checked_sub(position.credits)
                .ok_or(LockerError::Underflow)?;
            let vault_credits = state.vault_credits
                .checked_sub(position.credits)
                .ok_or(LockerError::Underflow)?;

            state.positions.insert(account, Position {
                amount: 0,
                credits: 0,
                ..position
            });
            state.total_locked = total_locked;
            state.total_credits = total_credits;
            state.vault_credits = vault_credits;
        }

        // 6. Pay out
        self.asset.borrow_mut().transfer(locker, account, underlying)?;

        // 7. Emit event
        self.emit(LockerEvent::Withdrawn {
            account,
            underlying,
            credits: position.credits,
            timestamp: ctx.timestamp,
        });

        Ok(())
    }

    fn process_batch(&self, ctx: &CallContext) -> LockerResult<u64> {
        let (batch_enabled, threshold) = {
            let state = self.state.borrow();
            (state.batch_enabled, state.batch_threshold)
        };

        // 1. Batch mode must be on
        if !batch_enabled {
            return Err(LockerError::BatchDisabled);
        }

        // 2. Enough must be pending
        let locker = self.config.locker;
        let pending = self.asset.borrow().balance_of(&locker);
        if pending < threshold {
            return Err(LockerError::BelowThreshold {
                available: pending,
                threshold,
            });
        }

        // 3. Finalize the waiting cohort
        let positions_finalized = finalize_cohort(&mut self.state.borrow_mut());

        // 4. One aggregate deposit
        let issued = self.vault.borrow_mut().deposit_savings(locker, pending, locker)?;
        {
            let mut state = self.state.borrow_mut();
            state.vault_credits = state.vault_credits
                .checked_add(issued)
                .ok_or(LockerError::Overflow)?;
        }

        // 5. Emit event
        self.emit(LockerEvent::BatchExecuted {
            underlying: pending,
            credits: issued,
            positions_finalized,
            timestamp: ctx.timestamp,
        });

        Ok(issued)
    }

    // ============ Helpers ============

    fn ensure_admin(&self, ctx: &CallContext) -> LockerResult<()> {
        if ctx.caller != self.config.admin {
            return Err(LockerError::AdminOnly);
        }
        Ok(())
    }

    fn emit(&self, event: LockerEvent) {
        self.events.borrow_mut().emit(event);
    }

    /// Run `op`, restoring locker state, vault, ledger and events if it fails.
    ///
    /// The checkpoint is a full clone of the position store, the vault and
    /// the underlying ledger, so every guarded call costs time linear in the
    /// number of positions and token holders.
    fn atomically<T>(&self, op: impl FnOnce() -> LockerResult<T>) -> LockerResult<T> {
        let state = self.state.borrow().clone();
        let asset = self.asset.borrow().clone();
        let vault = self.vault.borrow().clone();
        let events = self.events.borrow().len();

        let result = op();

        if result.is_err() {
            *self.state.borrow_mut() = state;
            *self.asset.borrow_mut() = asset;
            *self.vault.borrow_mut() = vault;
            self.events.borrow_mut().truncate(events);
        }
        result
    }

    // ============ Queries ============

    /// Underlying locked by `account`
    pub fn balance_of(&self, account: &Address) -> u64 {
        self.state.borrow().position(account).amount
    }

    /// Lockup applied to fresh locks
    pub fn get_duration(&self) -> u64 {
        self.config.lockup_duration
    }

    /// Full position record of `account`
    pub fn position(&self, account: &Address) -> Position {
        self.state.borrow().position(account)
    }

    /// Every account that ever locked, in first-lock order
    pub fn accounts(&self) -> Vec<Address> {
        self.state.borrow().account_index.clone()
    }

    /// Sum of all locked amounts
    pub fn total_locked(&self) -> u64 {
        self.state.borrow().total_locked
    }

    /// Sum of all position credits
    pub fn total_credits(&self) -> u64 {
        self.state.borrow().total_credits
    }

    /// Credits held in the vault minus credits attributed to positions
    pub fn credit_drift(&self) -> i128 {
        self.state.borrow().credit_drift()
    }

    /// Underlying held by the locker and not yet deposited
    pub fn pending_underlying(&self) -> u64 {
        self.asset.borrow().balance_of(&self.config.locker)
    }

    pub fn is_batch_enabled(&self) -> bool {
        self.state.borrow().batch_enabled
    }

    pub fn batch_threshold(&self) -> u64 {
        self.state.borrow().batch_threshold
    }

    /// Current underlying value of `account`'s credits.
    ///
    /// Fails with `ReentrancyDetected` while a vault call is in flight.
    pub fn underlying_value_of(&self, account: &Address) -> LockerResult<u64> {
        let credits = self.state.borrow().position(account).credits;
        self.vault()?.credits_to_underlying(credits)
    }

    pub fn config(&self) -> &LockerConfig {
        &self.config
    }

    pub fn state(&self) -> Ref<'_, LockerState> {
        self.state.borrow()
    }

    /// The savings vault, unless the locker is currently calling into it
    pub fn vault(&self) -> LockerResult<Ref<'_, V>> {
        self.vault
            .try_borrow()
            .map_err(|_| LockerError::ReentrancyDetected)
    }

    pub fn asset(&self) -> &SharedLedger {
        &self.asset
    }

    /// Events emitted so far
    pub fn events(&self) -> Vec<LockerEvent> {
        self.events.borrow().events().to_vec()
    }

    /// Take emitted events
    pub fn take_events(&self) -> Vec<LockerEvent> {
        self.events.borrow_mut().take()
    }
}

impl TokenLocker<SavingsContract> {
    /// Rebuild a locker, its vault and the ledger from a snapshot
    pub fn from_snapshot(snapshot: LockerSnapshot) -> LockerResult<Self> {
        let asset = snapshot.asset.shared();
        let vault = SavingsContract::from_state(snapshot.vault, asset.clone())?;
        Self::from_parts(snapshot.config, snapshot.state, asset, vault)
    }

    /// Capture locker, vault and ledger. Fails with `ReentrancyDetected`
    /// while a vault call is in flight.
    pub fn snapshot(&self) -> LockerResult<LockerSnapshot> {
        let vault = self.vault()?.state().clone();
        let asset = self
            .asset
            .try_borrow()
            .map_err(|_| LockerError::ReentrancyDetected)?
            .clone();
        Ok(LockerSnapshot {
            config: self.config.clone(),
            state: self.state.borrow().clone(),
            vault,
            asset,
        })
    }
}

// ============ Helper Functions ============

/// Unlock time after a lock at `now`.
///
/// An active lock keeps its unlock time; an empty or expired position
/// starts a fresh lockup.
pub fn next_unlock_time(position: &Position, now: u64, lockup_duration: u64) -> LockerResult<u64> {
    if position.amount > 0 && !position.is_expired(now) {
        return Ok(position.unlock_time);
    }
    now.checked_add(lockup_duration).ok_or(LockerError::Overflow)
}

/// Lock every waiting position. Returns how many flipped.
fn finalize_cohort(state: &mut LockerState) -> u32 {
    let LockerState { positions, account_index, .. } = state;
    let mut finalized = 0;
    for account in account_index.iter() {
        if let Some(position) = positions.get_mut(account) {
            if !position.locked {
                position.locked = true;
                finalized += 1;
            }
        }
    }
    finalized
}

/// Check position store invariants:
/// - the account index is duplicate-free and covers exactly the positions
/// - every indexed position is registered
/// - `total_locked` and `total_credits` equal the per-position sums
pub fn check_invariants(state: &LockerState) -> LockerResult<()> {
    let indexed: BTreeSet<&Address> = state.account_index.iter().collect();
    if indexed.len() != state.account_index.len() || indexed.len() != state.positions.len() {
        return Err(LockerError::InvalidStateTransition);
    }

    let mut total_locked: u64 = 0;
    let mut total_credits: u64 = 0;
    for account in &state.account_index {
        let position = state
            .positions
            .get(account)
            .ok_or(LockerError::InvalidStateTransition)?;
        if !position.registered {
            return Err(LockerError::InvalidStateTransition);
        }
        total_locked = total_locked
            .checked_add(position.amount)
            .ok_or(LockerError::Overflow)?;
        total_credits = total_credits
            .checked_add(position.credits)
            .ok_or(LockerError::Overflow)?;
    }

    if total_locked != state.total_locked || total_credits != state.total_credits {
        return Err(LockerError::InvalidStateTransition);
    }
    Ok(())
}

// ============ Tests ============
