//! Protocol Events for Keel
//!
//! Events are recorded during engine execution and can be drained by the
//! host for indexing, analytics, and notifications.

use crate::types::{Address, CollateralId};
use crate::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Event types for indexing and filtering
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Stability Pool Events (0x20 - 0x3F)
    StabilityDeposit = 0x20,
    StabilityWithdrawal = 0x21,
    GainsClaimed = 0x22,
    LiquidationOffset = 0x23,
    ScaleShifted = 0x24,
    EpochRolled = 0x25,
    RewardIssuance = 0x26,
}

/// Main event enum for the stability-pool engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PoolEvent {
    /// Emitted when a depositor adds kUSD to the pool
    StabilityDeposit {
        asset: CollateralId,
        depositor: Address,
        amount: u64,
        new_deposit: u64,
        pool_total: u64,
    },

    /// Emitted when a depositor withdraws kUSD from the pool
    StabilityWithdrawal {
        asset: CollateralId,
        depositor: Address,
        amount: u64,
        remaining_deposit: u64,
        pool_total: u64,
    },

    /// Emitted whenever pending gains are paid out (on deposit, withdraw,
    /// or an explicit claim)
    GainsClaimed {
        asset: CollateralId,
        depositor: Address,
        collateral_gain: u64,
        reward_gain: u64,
    },

    /// Emitted when a liquidation is offset against the pool
    LiquidationOffset {
        asset: CollateralId,
        debt_absorbed: u64,
        collateral_distributed: u64,
        pool_total: u64,
    },

    /// Emitted when P is renormalized to avoid fixed-point underflow
    ScaleShifted { asset: CollateralId, new_scale: u64 },

    /// Emitted when a full drain resets the pool into a new epoch
    EpochRolled { asset: CollateralId, new_epoch: u64 },

    /// Emitted when reward-token emission is folded into the pool
    RewardIssuance { asset: CollateralId, amount: u64 },
}

impl PoolEvent {
    /// The event's type discriminant, for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::StabilityDeposit { .. } => EventType::StabilityDeposit,
            Self::StabilityWithdrawal { .. } => EventType::StabilityWithdrawal,
            Self::GainsClaimed { .. } => EventType::GainsClaimed,
            Self::LiquidationOffset { .. } => EventType::LiquidationOffset,
            Self::ScaleShifted { .. } => EventType::ScaleShifted,
            Self::EpochRolled { .. } => EventType::EpochRolled,
            Self::RewardIssuance { .. } => EventType::RewardIssuance,
        }
    }
}

/// In-memory event log, drained by the host after each operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<PoolEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: PoolEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[PoolEvent] {
        &self.events
    }

    /// Remove and return all events
    pub fn drain(&mut self) -> Vec<PoolEvent> {
        core::mem::take(&mut self.events)
    }
}
