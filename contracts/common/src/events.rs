//! Protocol Events for the Token Locker
//!
//! Events are emitted during contract execution and can be indexed
//! off-chain for building UIs, analytics, and notifications.
//! They are the structured log of the system: every state change
//! records exactly one event.

use crate::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use crate::types::Address;

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Locker Events (0x10 - 0x1F)
    Locked = 0x10,
    Withdrawn = 0x11,
    BatchExecuted = 0x12,
    BatchModeChanged = 0x13,
    BatchThresholdChanged = 0x14,

    // Savings Vault Events (0x20 - 0x2F)
    SavingsDeposited = 0x20,
    CreditsRedeemed = 0x21,
    InterestCollected = 0x22,
}

/// Main event enum containing all possible protocol events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum LockerEvent {
    // ============ Locker Events ============

    /// Emitted when underlying is locked
    Locked {
        account: Address,
        amount: u64,
        credits: u64,
        unlock_time: u64,
        timestamp: u64,
    },

    /// Emitted when a position is withdrawn
    Withdrawn {
        account: Address,
        underlying: u64,
        credits: u64,
        timestamp: u64,
    },

    /// Emitted when pending underlying is swept into the vault
    BatchExecuted {
        underlying: u64,
        credits: u64,
        positions_finalized: u32,
        timestamp: u64,
    },

    /// Emitted when batch mode is toggled
    BatchModeChanged {
        enabled: bool,
        by: Address,
        timestamp: u64,
    },

    /// Emitted when the sweep threshold changes
    BatchThresholdChanged {
        old_threshold: u64,
        new_threshold: u64,
        timestamp: u64,
    },

    // ============ Savings Vault Events ============

    /// Emitted when underlying is converted to credits
    SavingsDeposited {
        depositor: Address,
        beneficiary: Address,
        underlying: u64,
        credits: u64,
        exchange_rate: u128,
    },

    /// Emitted when credits are converted back to underlying
    CreditsRedeemed {
        redeemer: Address,
        credits: u64,
        underlying: u64,
        exchange_rate: u128,
    },

    /// Emitted when yield is added to the vault
    InterestCollected {
        amount: u64,
        old_rate: u128,
        new_rate: u128,
    },
}

impl LockerEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Locked { .. } => EventType::Locked,
            Self::Withdrawn { .. } => EventType::Withdrawn,
            Self::BatchExecuted { .. } => EventType::BatchExecuted,
            Self::BatchModeChanged { .. } => EventType::BatchModeChanged,
            Self::BatchThresholdChanged { .. } => EventType::BatchThresholdChanged,
            Self::SavingsDeposited { .. } => EventType::SavingsDeposited,
            Self::CreditsRedeemed { .. } => EventType::CreditsRedeemed,
            Self::InterestCollected { .. } => EventType::InterestCollected,
        }
    }

    /// Time the event occurred, for locker events
    pub fn timestamp(&self) -> Option<u64> {
        match self {
            Self::Locked { timestamp, .. } => Some(*timestamp),
            Self::Withdrawn { timestamp, .. } => Some(*timestamp),
            Self::BatchExecuted { timestamp, .. } => Some(*timestamp),
            Self::BatchModeChanged { timestamp, .. } => Some(*timestamp),
            Self::BatchThresholdChanged { timestamp, .. } => Some(*timestamp),
            // The vault has no clock of its own
            Self::SavingsDeposited { .. }
            | Self::CreditsRedeemed { .. }
            | Self::InterestCollected { .. } => None,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting multiple events during execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<LockerEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: LockerEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[LockerEvent] {
        &self.events
    }

    /// Take all events, leaving the log empty
    pub fn take(&mut self) -> Vec<LockerEvent> {
        core::mem::take(&mut self.events)
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&LockerEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Drop events past `len` (used when a failed call is rolled back)
    pub fn truncate(&mut self, len: usize) {
        self.events.truncate(len);
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let event = LockerEvent::Locked {
            account: [1u8; 32],
            amount: 100_00000000,
            credits: 1_000_00000001,
            unlock_time: 1_000,
            timestamp: 100,
        };

        assert_eq!(event.event_type(), EventType::Locked);
        assert_eq!(event.timestamp(), Some(100));
    }

    #[test]
    fn test_event_serialization() {
        let event = LockerEvent::Withdrawn {
            account: [1u8; 32],
            underlying: 110_00000000,
            credits: 1_000_00000001,
            timestamp: 200,
        };

        let bytes = event.to_bytes();
        let restored = LockerEvent::from_bytes(&bytes).unwrap();

        assert_eq!(event, restored);
    }

    #[test]
    fn test_event_log() {
        let mut log = EventLog::new();

        log.emit(LockerEvent::BatchModeChanged {
            enabled: true,
            by: [9u8; 32],
            timestamp: 100,
        });

        log.emit(LockerEvent::Locked {
            account: [2u8; 32],
            amount: 4,
            credits: 41,
            unlock_time: 1_000,
            timestamp: 100,
        });

        assert_eq!(log.len(), 2);
        assert!(log.has_events());

        let locks = log.filter_by_type(EventType::Locked);
        assert_eq!(locks.len(), 1);

        log.truncate(1);
        assert_eq!(log.len(), 1);

        let taken = log.take();
        assert_eq!(taken.len(), 1);
        assert!(log.is_empty());
    }
}
