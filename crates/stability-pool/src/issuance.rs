//! Reward Emission
//!
//! KEEL rewards accrue to stability depositors continuously over time. The
//! engine asks an [`IssuanceSource`] how much has become issuable since the
//! last settlement and folds that amount into the `G` accumulator on every
//! pool-touching operation. Issuance that falls due while the pool is empty
//! is skipped, not queued: those tokens are simply never minted into the
//! pool's share.

use borsh::{BorshDeserialize, BorshSerialize};
use keel_common::constants::emission::{DEFAULT_WEEKLY_REWARD, SECONDS_PER_WEEK, SUPPLY_CAP};
use keel_common::types::Timestamp;
use serde::{Deserialize, Serialize};

/// External source of reward-token emission.
///
/// Implementations must be monotonic (repeated calls with advancing `now`
/// never return amounts summing past the source's cap) and tolerate clock
/// regressions by returning zero.
pub trait IssuanceSource {
    /// Reward tokens issuable for the window `(last, now]`
    fn issue_since(&mut self, last: Timestamp, now: Timestamp) -> u64;
}

/// Linear weekly emission schedule with a hard supply cap.
///
/// Issuance is computed from the cumulative curve
/// `expected(now) = min(cap, weekly * (now - start) / week)` minus what has
/// already been issued, so settlement frequency never changes the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RewardSchedule {
    /// KEEL issued per week
    pub weekly_amount: u64,
    /// Total KEEL ever issuable through this schedule
    pub supply_cap: u64,
    /// Timestamp the emission curve starts from
    pub start: Timestamp,
    /// Cumulative KEEL issued so far
    pub total_issued: u64,
}

impl RewardSchedule {
    /// Create a schedule starting at the given time
    pub fn new(weekly_amount: u64, supply_cap: u64, start: Timestamp) -> Self {
        Self {
            weekly_amount,
            supply_cap,
            start,
            total_issued: 0,
        }
    }

    /// Schedule with the network's default rate and cap
    pub fn with_defaults(start: Timestamp) -> Self {
        Self::new(DEFAULT_WEEKLY_REWARD, SUPPLY_CAP, start)
    }

    /// KEEL still issuable before the cap is reached
    pub fn remaining(&self) -> u64 {
        self.supply_cap.saturating_sub(self.total_issued)
    }

    /// Cumulative emission the curve has released by `now`
    fn expected_by(&self, now: Timestamp) -> u64 {
        let elapsed = now.saturating_sub(self.start);
        let due = (self.weekly_amount as u128 * elapsed as u128) / SECONDS_PER_WEEK as u128;
        due.min(self.supply_cap as u128) as u64
    }
}

impl IssuanceSource for RewardSchedule {
    fn issue_since(&mut self, last: Timestamp, now: Timestamp) -> u64 {
        if now <= last {
            return 0;
        }
        let issued = self.expected_by(now).saturating_sub(self.total_issued);
        self.total_issued += issued;
        issued
    }
}
