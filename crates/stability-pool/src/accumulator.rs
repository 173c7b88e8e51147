//! Reward Accumulator
//!
//! Maintains the three running accumulators of the pool:
//!
//! - `P`: cumulative product of per-liquidation retention ratios. A
//!   depositor's compounded balance is `deposit * P / P_snapshot`.
//! - `S`: cumulative collateral gain per unit staked, bucketed by
//!   `(epoch, scale)`.
//! - `G`: cumulative KEEL reward per unit staked, same bucketing.
//!
//! `P` only decreases within an epoch. When an offset would push it below
//! `P_RENORM_THRESHOLD` (1e-9), it is renormalized by `SCALE_SHIFT` (1e9),
//! once per scale increment until it lands back in the representable band,
//! preserving ratio information that plain fixed point would truncate to
//! zero. A single offset can shift the scale more than once; `P` always
//! stays in `[P_RENORM_THRESHOLD, DECIMAL_PRECISION]`. When a liquidation
//! consumes the
//! entire pool, `current_epoch` increments and `P` resets to 1.0; sums of
//! the old epoch are never read again.
//!
//! Per-unit divisions truncate; the remainder of every division is carried
//! into the next event through the `last_*_error` trackers so cumulative
//! distribution stays within one unit of exact. The loss quotient is rounded
//! up so compounded-deposit error always favors the pool.

use borsh::{BorshDeserialize, BorshSerialize};
use keel_common::constants::stability_pool::{DECIMAL_PRECISION, P_RENORM_THRESHOLD, SCALE_SHIFT};
use keel_common::errors::{KeelError, KeelResult};
use keel_common::math::{mul_div, safe_add_u128};
use keel_common::BTreeMap;
use serde::{Deserialize, Serialize};

/// Cumulative gain-per-unit-staked for one `(epoch, scale)` bucket
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct SumPair {
    /// Collateral gain per unit staked (1e18-scaled)
    pub s: u128,
    /// KEEL reward per unit staked (1e18-scaled)
    pub g: u128,
}

/// Result of applying one offset to the accumulators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetApplied {
    /// The pool was fully drained and a new epoch opened
    pub epoch_rolled: bool,
    /// P was renormalized and the scale incremented at least once
    pub scale_shifted: bool,
}

/// Pool-wide accumulator state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardAccumulator {
    /// Compounding factor, starts at 1.0 (1e18-scaled)
    pub p: u128,
    /// Scale shifts applied to P within the current epoch
    pub current_scale: u64,
    /// Incremented every time a liquidation empties the pool
    pub current_epoch: u64,
    /// Cumulative sums per (epoch, scale) bucket; absent keys read zero
    pub sums: BTreeMap<(u64, u64), SumPair>,
    /// Truncation remainder of the last collateral distribution
    pub last_collateral_error: u128,
    /// Truncation remainder of the last loss division
    pub last_loss_error: u128,
    /// Truncation remainder of the last reward distribution
    pub last_reward_error: u128,
}

impl Default for RewardAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl RewardAccumulator {
    /// Create accumulator state for a fresh pool
    pub fn new() -> Self {
        Self {
            p: DECIMAL_PRECISION,
            current_scale: 0,
            current_epoch: 0,
            sums: BTreeMap::new(),
            last_collateral_error: 0,
            last_loss_error: 0,
            last_reward_error: 0,
        }
    }

    /// Sums for the given bucket; zero for buckets never written
    pub fn sum_at(&self, epoch: u64, scale: u64) -> SumPair {
        self.sums.get(&(epoch, scale)).copied().unwrap_or_default()
    }

    /// Sums for the current bucket
    pub fn current_sums(&self) -> SumPair {
        self.sum_at(self.current_epoch, self.current_scale)
    }

    /// Collateral distributed per unit staked (1e18-scaled), with the
    /// truncation remainder carried into the next distribution.
    ///
    /// `total` is the pool's deposits at the moment of the liquidation.
    pub fn collateral_per_unit(&mut self, collateral: u64, total: u64) -> KeelResult<u128> {
        if total == 0 {
            return Err(KeelError::DivisionByZero);
        }
        let numerator = safe_add_u128(
            (collateral as u128)
                .checked_mul(DECIMAL_PRECISION)
                .ok_or(KeelError::Overflow)?,
            self.last_collateral_error,
        )?;
        let per_unit = numerator / total as u128;
        self.last_collateral_error = numerator - per_unit * total as u128;
        Ok(per_unit)
    }

    /// Fraction of the pool consumed by an offset (1e18-scaled).
    ///
    /// Exactly `DECIMAL_PRECISION` when `debt == total` (full drain);
    /// otherwise rounded up by one and kept strictly below full precision,
    /// with the over-count carried into the next offset.
    pub fn loss_per_unit(&mut self, debt: u64, total: u64) -> KeelResult<u128> {
        if total == 0 {
            return Err(KeelError::DivisionByZero);
        }
        if debt == total {
            self.last_loss_error = 0;
            return Ok(DECIMAL_PRECISION);
        }
        let numerator = (debt as u128)
            .checked_mul(DECIMAL_PRECISION)
            .ok_or(KeelError::Overflow)?
            .saturating_sub(self.last_loss_error);
        let per_unit = numerator / total as u128 + 1;
        if per_unit >= DECIMAL_PRECISION {
            self.last_loss_error = 0;
            return Ok(DECIMAL_PRECISION - 1);
        }
        self.last_loss_error = per_unit * total as u128 - numerator;
        Ok(per_unit)
    }

    /// Fold one liquidation into `S` and compound `P`.
    ///
    /// The marginal gain is weighted by the current `P` so that reads
    /// against any snapshot stay proportional regardless of how many
    /// liquidations happened in between. A `loss_per_unit` of full
    /// precision rolls the epoch; it is only produced by the full-drain
    /// branch of `loss_per_unit`.
    pub fn apply_offset(
        &mut self,
        coll_per_unit: u128,
        loss_per_unit: u128,
    ) -> KeelResult<OffsetApplied> {
        let marginal = mul_div(coll_per_unit, self.p, DECIMAL_PRECISION)?;
        let bucket = (self.current_epoch, self.current_scale);
        let current = self.sum_at(self.current_epoch, self.current_scale);
        let new_s = safe_add_u128(current.s, marginal)?;

        if loss_per_unit >= DECIMAL_PRECISION {
            // Full drain: record the final sum, then isolate everything
            // that follows in a fresh epoch.
            self.sums.entry(bucket).or_default().s = new_s;
            self.current_epoch += 1;
            self.current_scale = 0;
            self.p = DECIMAL_PRECISION;
            self.last_collateral_error = 0;
            self.last_loss_error = 0;
            self.last_reward_error = 0;
            return Ok(OffsetApplied {
                epoch_rolled: true,
                scale_shifted: false,
            });
        }

        let retention = DECIMAL_PRECISION - loss_per_unit;
        // P and retention are both at most 1e18, so the undivided product
        // stays below 1e36 throughout the loop, inside u128
        let mut product = self.p.checked_mul(retention).ok_or(KeelError::Overflow)?;
        let mut shifts = 0u64;
        // Renormalize the undivided product so no precision is lost; one
        // scale increment per factor of SCALE_SHIFT. A heavy enough loss
        // needs more than one factor to land P back in the representable
        // band.
        while product / DECIMAL_PRECISION < P_RENORM_THRESHOLD {
            product = product.checked_mul(SCALE_SHIFT).ok_or(KeelError::Overflow)?;
            shifts += 1;
        }
        let new_p = product / DECIMAL_PRECISION;
        debug_assert!(new_p >= P_RENORM_THRESHOLD && new_p <= DECIMAL_PRECISION);

        self.sums.entry(bucket).or_default().s = new_s;
        self.p = new_p;
        self.current_scale += shifts;
        Ok(OffsetApplied {
            epoch_rolled: false,
            scale_shifted: shifts > 0,
        })
    }

    /// Fold a reward-token emission into `G` for the current bucket.
    pub fn accumulate_reward(&mut self, issued: u64, total: u64) -> KeelResult<()> {
        if issued == 0 {
            return Ok(());
        }
        if total == 0 {
            return Err(KeelError::DivisionByZero);
        }
        let numerator = safe_add_u128(
            (issued as u128)
                .checked_mul(DECIMAL_PRECISION)
                .ok_or(KeelError::Overflow)?,
            self.last_reward_error,
        )?;
        let per_unit = numerator / total as u128;
        let marginal = mul_div(per_unit, self.p, DECIMAL_PRECISION)?;
        let bucket = (self.current_epoch, self.current_scale);
        let current_g = self.sum_at(self.current_epoch, self.current_scale).g;
        let new_g = safe_add_u128(current_g, marginal)?;

        self.last_reward_error = numerator - per_unit * total as u128;
        self.sums.entry(bucket).or_default().g = new_g;
        Ok(())
    }
}
