//! Charms SDK Integration for the Token Locker
//!
//! Bridges Charms transactions to the locker's state machine.
//!
//! ## UTXO Transformation Model
//!
//! The whole locker (config, positions, vault and underlying ledger) lives
//! in a single state charm. A spell spends the current state and proposes
//! the next one; the witness names the operation.
//!
//! ```text
//! Lock / Withdraw / BatchExecute / admin setters:
//!   IN:  [Locker snapshot (current)]
//!   OUT: [Locker snapshot (proposed)]
//!
//! Initialize:
//!   IN:  []
//!   OUT: [Locker snapshot (fresh)]
//! ```
//!
//! Validation replays the operation on the input snapshot and accepts the
//! spell only if the result matches the proposed output exactly.

use charms_data::{App, Data, Transaction};

use crate::{LockerSnapshot, TokenLocker};
use locker_common::{
    token_ops::UNLIMITED_ALLOWANCE,
    types::{Address, AppId, CallContext, LockerAction, LockerState},
};

// ============ Operation Codes ============

/// Operation codes for locker actions (encoded in witness)
pub mod op {
    /// Create the locker state charm
    pub const INITIALIZE: u8 = 0x00;
    /// Lock underlying (for the caller or a beneficiary)
    pub const LOCK: u8 = 0x10;
    /// Withdraw an expired position
    pub const WITHDRAW: u8 = 0x11;
    /// Sweep pending underlying into the vault
    pub const BATCH_EXECUTE: u8 = 0x12;
    /// Switch batch mode (admin)
    pub const SET_BATCH_ENABLE: u8 = 0x13;
    /// Change the sweep threshold (admin)
    pub const SET_BATCH_THRESHOLD: u8 = 0x14;
}

// ============ Witness Structures ============

/// Witness data for locker operations
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LockerWitness {
    /// Operation type (see `op` module)
    pub op: u8,
    /// Account authorizing the operation
    pub caller: Address,
    /// Block time the operation is evaluated at
    pub timestamp: u64,
    /// Amount for lock operations
    pub amount: Option<u64>,
    /// Position owner when locking on someone else's behalf
    pub beneficiary: Option<Address>,
    /// Flag for batch mode changes
    pub enabled: Option<bool>,
    /// New sweep threshold
    pub threshold: Option<u64>,
}

impl LockerWitness {
    fn bare(op: u8, caller: Address, timestamp: u64) -> Self {
        Self {
            op,
            caller,
            timestamp,
            amount: None,
            beneficiary: None,
            enabled: None,
            threshold: None,
        }
    }

    /// Create witness for initialization (signed by the admin)
    pub fn initialize(admin: Address, timestamp: u64) -> Self {
        Self::bare(op::INITIALIZE, admin, timestamp)
    }

    /// Create witness for locking into the caller's own position
    pub fn lock(caller: Address, timestamp: u64, amount: u64) -> Self {
        Self {
            amount: Some(amount),
            ..Self::bare(op::LOCK, caller, timestamp)
        }
    }

    /// Create witness for locking into `beneficiary`'s position
    pub fn lock_for(caller: Address, timestamp: u64, beneficiary: Address, amount: u64) -> Self {
        Self {
            amount: Some(amount),
            beneficiary: Some(beneficiary),
            ..Self::bare(op::LOCK, caller, timestamp)
        }
    }

    pub fn withdraw(caller: Address, timestamp: u64) -> Self {
        Self::bare(op::WITHDRAW, caller, timestamp)
    }

    pub fn batch_execute(caller: Address, timestamp: u64) -> Self {
        Self::bare(op::BATCH_EXECUTE, caller, timestamp)
    }

    pub fn set_batch_enable(caller: Address, timestamp: u64, enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::bare(op::SET_BATCH_ENABLE, caller, timestamp)
        }
    }

    pub fn set_batch_threshold(caller: Address, timestamp: u64, threshold: u64) -> Self {
        Self {
            threshold: Some(threshold),
            ..Self::bare(op::SET_BATCH_THRESHOLD, caller, timestamp)
        }
    }

    /// Call context the operation runs under
    pub fn context(&self) -> CallContext {
        CallContext::new(self.caller, self.timestamp)
    }
}

// ============ Main Validation Function ============

/// Validates a locker operation within a Charms transaction.
///
/// # Arguments
/// * `app` - The locker app definition
/// * `tx` - The transaction being validated
/// * `_x` - Public inputs (unused)
/// * `w` - Witness data (operation details)
///
/// # Returns
/// `true` if the proposed output state is exactly what the operation
/// produces from the input state, `false` otherwise
pub fn validate_locker_operation(app: &App, tx: &Transaction, _x: &Data, w: &Data) -> bool {
    // 1. Parse witness
    let witness = match parse_witness(w) {
        Some(w) => w,
        None => return false,
    };

    // 2. Proposed state
    let output = match extract_output_snapshot(app, tx) {
        Some(s) => s,
        None => return false,
    };

    // 3. Initialize creates the state charm from nothing
    let input = extract_input_snapshot(app, tx);
    if witness.op == op::INITIALIZE {
        return input.is_none() && validate_initialize(&app.identity.0, &output, &witness);
    }

    // 4. Everything else transforms an existing state
    let input = match input {
        Some(s) => s,
        None => return false,
    };

    // 5. Replay and compare
    match replay(input, &witness) {
        Some(replayed) => replayed == output,
        None => false,
    }
}

/// Apply the witnessed operation to `input`. Returns the resulting
/// snapshot, or `None` if the witness is malformed or the operation fails.
pub fn replay(input: LockerSnapshot, witness: &LockerWitness) -> Option<LockerSnapshot> {
    let action = witness_to_action(witness)?;
    let locker = TokenLocker::from_snapshot(input).ok()?;
    locker.execute(&witness.context(), &action).ok()?;
    locker.snapshot().ok()
}

// ============ Parsing Functions ============

/// Parse witness data into LockerWitness
fn parse_witness(w: &Data) -> Option<LockerWitness> {
    w.value::<LockerWitness>().ok()
}

/// Convert witness to internal action type
fn witness_to_action(w: &LockerWitness) -> Option<LockerAction> {
    match w.op {
        op::LOCK => {
            let amount = w.amount?;
            Some(match w.beneficiary {
                Some(beneficiary) => LockerAction::LockFor { beneficiary, amount },
                None => LockerAction::Lock { amount },
            })
        }
        op::WITHDRAW => Some(LockerAction::Withdraw),
        op::BATCH_EXECUTE => Some(LockerAction::BatchExecute),
        op::SET_BATCH_ENABLE => Some(LockerAction::SetBatchEnable {
            enabled: w.enabled?,
        }),
        op::SET_BATCH_THRESHOLD => Some(LockerAction::SetBatchThreshold {
            threshold: w.threshold?,
        }),
        _ => None,
    }
}

/// Validate a freshly created locker state
fn validate_initialize(app_id: &AppId, output: &LockerSnapshot, witness: &LockerWitness) -> bool {
    // Admin signs the deployment
    if witness.caller != output.config.admin {
        return false;
    }
    // Underlying must be another app, never the locker itself
    if output.config.underlying == *app_id {
        return false;
    }
    // No positions, default batch settings
    if output.state != LockerState::new() {
        return false;
    }
    // Vault can pull from the locker
    let allowance = output
        .asset
        .allowance(&output.config.locker, &output.config.savings_vault);
    if allowance != UNLIMITED_ALLOWANCE {
        return false;
    }
    // Config, vault and ledger must form a usable locker
    TokenLocker::from_snapshot(output.clone()).is_ok()
}

// ============ State Extraction ============

/// Locker state being spent
fn extract_input_snapshot(app: &App, tx: &Transaction) -> Option<LockerSnapshot> {
    tx.ins.iter().find_map(|(_, charms)| {
        charms
            .get(app)
            .and_then(|data| data.value::<LockerSnapshot>().ok())
    })
}

/// Locker state being created
fn extract_output_snapshot(app: &App, tx: &Transaction) -> Option<LockerSnapshot> {
    tx.outs.iter().find_map(|charms| {
        charms
            .get(app)
            .and_then(|data| data.value::<LockerSnapshot>().ok())
    })
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;
    use locker_common::{
        constants::locker::LOCKUP_DURATION,
        token_ops::TokenLedger,
        types::LockerConfig,
    };
    use locker_savings_vault::SavingsContract;

    const ONE_TOKEN: u64 = 100_000_000;
    const T0: u64 = 1_700_000_000;
    const LOCKER_APP: AppId = [30u8; 32];

    fn admin() -> Address {
        [1u8; 32]
    }

    fn alice() -> Address {
        [2u8; 32]
    }

    fn create_test_snapshot() -> LockerSnapshot {
        let locker_account = [10u8; 32];
        let vault_account = [11u8; 32];
        let mut ledger = TokenLedger::new();
        ledger.mint(alice(), 1_000 * ONE_TOKEN).unwrap();
        ledger.approve(alice(), locker_account, UNLIMITED_ALLOWANCE);
        let asset = ledger.shared();

        let vault = SavingsContract::new(vault_account, [12u8; 32], asset.clone());
        let config = LockerConfig::new(locker_account, [20u8; 32], vault_account, admin());
        TokenLocker::new(config, asset, vault).unwrap().snapshot().unwrap()
    }

    #[test]
    fn test_witness_serialization() {
        let witness = LockerWitness::lock(alice(), T0, 100 * ONE_TOKEN);
        let data = Data::from(&witness);
        let parsed = parse_witness(&data).unwrap();

        assert_eq!(parsed, witness);
        assert_eq!(parsed.op, op::LOCK);
    }

    #[test]
    fn test_witness_to_action() {
        let cases = [
            (
                LockerWitness::lock(alice(), T0, 5),
                LockerAction::Lock { amount: 5 },
            ),
            (
                LockerWitness::lock_for(alice(), T0, admin(), 5),
                LockerAction::LockFor { beneficiary: admin(), amount: 5 },
            ),
            (LockerWitness::withdraw(alice(), T0), LockerAction::Withdraw),
            (LockerWitness::batch_execute(alice(), T0), LockerAction::BatchExecute),
            (
                LockerWitness::set_batch_enable(admin(), T0, true),
                LockerAction::SetBatchEnable { enabled: true },
            ),
            (
                LockerWitness::set_batch_threshold(admin(), T0, 7),
                LockerAction::SetBatchThreshold { threshold: 7 },
            ),
        ];

        for (witness, expected) in cases {
            assert_eq!(witness_to_action(&witness), Some(expected));
        }
    }

    #[test]
    fn test_malformed_witness_rejected() {
        let mut witness = LockerWitness::lock(alice(), T0, 5);
        witness.amount = None;
        assert_eq!(witness_to_action(&witness), None);

        assert_eq!(witness_to_action(&LockerWitness::initialize(admin(), T0)), None);
        assert_eq!(witness_to_action(&LockerWitness::bare(0x7f, alice(), T0)), None);
    }

    #[test]
    fn test_replay_lock_matches_live_locker() {
        let input = create_test_snapshot();
        let witness = LockerWitness::lock(alice(), T0, 100 * ONE_TOKEN);

        let replayed = replay(input.clone(), &witness).unwrap();

        let live = TokenLocker::from_snapshot(input).unwrap();
        live.lock(&witness.context(), 100 * ONE_TOKEN).unwrap();
        assert_eq!(replayed, live.snapshot().unwrap());
        assert_eq!(replayed.state.position(&alice()).unlock_time, T0 + LOCKUP_DURATION);
    }

    #[test]
    fn test_replay_failing_operation_rejected() {
        let input = create_test_snapshot();

        // Nothing locked yet
        assert!(replay(input.clone(), &LockerWitness::withdraw(alice(), T0)).is_none());
        // Not the admin
        assert!(replay(input, &LockerWitness::set_batch_enable(alice(), T0, true)).is_none());
    }

    #[test]
    fn test_initialize_checks() {
        let output = create_test_snapshot();
        let init = LockerWitness::initialize(admin(), T0);

        assert!(validate_initialize(&LOCKER_APP, &output, &init));
        assert!(!validate_initialize(&LOCKER_APP, &output, &LockerWitness::initialize(alice(), T0)));

        let mut dirty = output.clone();
        dirty.state.batch_enabled = true;
        assert!(!validate_initialize(&LOCKER_APP, &dirty, &init));

        let mut unapproved = output.clone();
        let (locker, vault) = (unapproved.config.locker, unapproved.config.savings_vault);
        unapproved.asset.approve(locker, vault, 0);
        assert!(!validate_initialize(&LOCKER_APP, &unapproved, &init));
    }

    #[test]
    fn test_initialize_binds_underlying() {
        let output = create_test_snapshot();
        let init = LockerWitness::initialize(admin(), T0);

        // Locker pointing at its own app as the underlying
        assert!(!validate_initialize(&output.config.underlying, &output, &init));

        let mut unset = output;
        unset.config.underlying = [0u8; 32];
        assert!(!validate_initialize(&LOCKER_APP, &unset, &init));
    }
}
