//! Stability Pool Engine
//!
//! One engine instance per collateral asset. The engine owns the pool-wide
//! accumulators, the depositor records, and the reward-emission clock, and
//! exposes the five mutating operations of the pool:
//!
//! - **Depositor operations**: `deposit`, `withdraw`, `claim_gains`
//! - **Liquidation absorption**: `offset`, called by the vault manager
//! - **Emission settlement**: `settle_issuance`, folds time-based KEEL
//!   emission into `G`
//!
//! Every mutating operation settles pending emission first and flushes the
//! caller's pending gains before touching their balance; a pending gain is
//! never silently dropped. Emission settlement is an operation of its own
//! and stays committed even when the enclosing call later fails; all other
//! writes happen only after the operation's validation has passed, so an
//! `Err` never leaves a partial update behind.
//!
//! The engine only accounts: actual token movement is the host's job, driven
//! by the amounts reported in the outcome structs and events.

use borsh::{BorshDeserialize, BorshSerialize};
use keel_common::constants::stability_pool::{DEPOSIT_DUST, POOL_DUST};
use keel_common::errors::{AmountErrorReason, KeelError, KeelResult};
use keel_common::events::{EventLog, PoolEvent};
use keel_common::math::{safe_add, safe_sub};
use keel_common::types::{Address, CollateralId, Timestamp};
use keel_common::{BTreeMap, Vec};
use serde::{Deserialize, Serialize};

use crate::accumulator::{RewardAccumulator, SumPair};
use crate::deposits::PoolDeposit;
use crate::issuance::{IssuanceSource, RewardSchedule};

// ============================================================================
// Outcomes
// ============================================================================

/// Result of a deposit operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositOutcome {
    /// Depositor's recorded balance after the deposit
    pub new_deposit: u64,
    /// Collateral gain paid out before the balance change
    pub collateral_paid: u64,
    /// KEEL reward paid out before the balance change
    pub reward_paid: u64,
    /// New pool total
    pub pool_total: u64,
}

/// Result of a withdrawal operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawOutcome {
    /// kUSD actually withdrawn (requested amount clamped to the compounded
    /// balance, plus any flushed dust remainder)
    pub withdrawn: u64,
    /// Depositor's recorded balance after the withdrawal
    pub remaining: u64,
    /// Collateral gain paid out with the withdrawal
    pub collateral_paid: u64,
    /// KEEL reward paid out with the withdrawal
    pub reward_paid: u64,
    /// New pool total
    pub pool_total: u64,
}

/// Result of an explicit gain claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimOutcome {
    /// Collateral gain paid out
    pub collateral_paid: u64,
    /// KEEL reward paid out
    pub reward_paid: u64,
    /// Depositor's re-based recorded balance
    pub new_deposit: u64,
}

/// Result of a liquidation offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetOutcome {
    /// Debt cancelled against the pool
    pub debt_absorbed: u64,
    /// Collateral credited to the pool for distribution
    pub collateral_distributed: u64,
    /// The offset fully drained the pool and opened a new epoch
    pub epoch_rolled: bool,
    /// P was renormalized during this offset
    pub scale_shifted: bool,
    /// New pool total
    pub pool_total: u64,
}

// ============================================================================
// Engine
// ============================================================================

/// Stability Pool accounting engine for one collateral asset
#[derive(Debug, Clone)]
pub struct StabilityPoolEngine<I = RewardSchedule> {
    asset: CollateralId,
    total_deposits: u64,
    accumulator: RewardAccumulator,
    deposits: BTreeMap<Address, PoolDeposit>,
    issuance: I,
    last_emission_at: Timestamp,
    events: EventLog,
}

impl<I: IssuanceSource> StabilityPoolEngine<I> {
    /// Create an empty pool for the given asset, with emission settled up
    /// to `now`
    pub fn new(asset: CollateralId, issuance: I, now: Timestamp) -> Self {
        Self {
            asset,
            total_deposits: 0,
            accumulator: RewardAccumulator::new(),
            deposits: BTreeMap::new(),
            issuance,
            last_emission_at: now,
            events: EventLog::new(),
        }
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// The collateral asset this pool absorbs liquidations for
    pub fn asset(&self) -> CollateralId {
        self.asset
    }

    /// Total kUSD currently held by the pool
    pub fn total_deposits(&self) -> u64 {
        self.total_deposits
    }

    /// Number of live deposit records
    pub fn depositor_count(&self) -> usize {
        self.deposits.len()
    }

    /// Accumulator state (read-only)
    pub fn accumulator(&self) -> &RewardAccumulator {
        &self.accumulator
    }

    /// Timestamp emission was last settled at
    pub fn last_emission_at(&self) -> Timestamp {
        self.last_emission_at
    }

    /// Depositor's current compounded kUSD balance; zero if unknown
    pub fn compounded_deposit(&self, depositor: &Address) -> KeelResult<u64> {
        match self.deposits.get(depositor) {
            Some(d) => d.compounded(&self.accumulator),
            None => Ok(0),
        }
    }

    /// Depositor's pending collateral gain; zero if unknown
    pub fn pending_collateral_gain(&self, depositor: &Address) -> KeelResult<u64> {
        match self.deposits.get(depositor) {
            Some(d) => d.pending_collateral_gain(&self.accumulator),
            None => Ok(0),
        }
    }

    /// Depositor's pending KEEL reward as of the last settlement; zero if
    /// unknown. Emission accrued since then is folded in on the next
    /// pool-touching operation.
    pub fn pending_reward_gain(&self, depositor: &Address) -> KeelResult<u64> {
        match self.deposits.get(depositor) {
            Some(d) => d.pending_reward_gain(&self.accumulator),
            None => Ok(0),
        }
    }

    /// Events recorded since the last drain
    pub fn events(&self) -> &[PoolEvent] {
        self.events.events()
    }

    /// Remove and return all recorded events
    pub fn drain_events(&mut self) -> Vec<PoolEvent> {
        self.events.drain()
    }

    // ------------------------------------------------------------------
    // Mutating operations
    // ------------------------------------------------------------------

    /// Fold reward emission accrued since the last settlement into `G`.
    ///
    /// Returns the amount folded into the pool. Always advances the
    /// emission clock; issuance falling due while the pool is empty is
    /// skipped, not queued.
    pub fn settle_issuance(&mut self, now: Timestamp) -> KeelResult<u64> {
        if now <= self.last_emission_at {
            return Ok(0);
        }
        let issued = self.issuance.issue_since(self.last_emission_at, now);
        self.last_emission_at = now;
        if issued == 0 || self.total_deposits == 0 {
            return Ok(0);
        }
        self.accumulator
            .accumulate_reward(issued, self.total_deposits)?;
        self.events.emit(PoolEvent::RewardIssuance {
            asset: self.asset,
            amount: issued,
        });
        Ok(issued)
    }

    /// Add kUSD to the pool.
    ///
    /// Pending gains are flushed first, the recorded balance is re-based to
    /// compounded + amount, and the snapshot refreshes to the current
    /// accumulator state.
    pub fn deposit(
        &mut self,
        depositor: Address,
        amount: u64,
        now: Timestamp,
    ) -> KeelResult<DepositOutcome> {
        if amount == 0 {
            return Err(KeelError::InvalidAmount {
                amount,
                reason: AmountErrorReason::Zero,
            });
        }
        self.settle_issuance(now)?;

        let (compounded, collateral_paid, reward_paid) = self.pending_state(&depositor)?;
        let new_deposit = safe_add(compounded, amount)?;
        let pool_total = safe_add(self.total_deposits, amount)?;

        self.total_deposits = pool_total;
        self.deposits.insert(
            depositor,
            PoolDeposit::new(depositor, new_deposit, &self.accumulator, now),
        );
        self.emit_gains(depositor, collateral_paid, reward_paid);
        self.events.emit(PoolEvent::StabilityDeposit {
            asset: self.asset,
            depositor,
            amount,
            new_deposit,
            pool_total,
        });

        Ok(DepositOutcome {
            new_deposit,
            collateral_paid,
            reward_paid,
            pool_total,
        })
    }

    /// Withdraw kUSD from the pool.
    ///
    /// The requested amount is clamped to the current compounded balance;
    /// withdrawing everything (or more) zeroes the record. A remainder at
    /// or below the dust threshold is flushed with the withdrawal. A stake
    /// fully consumed by liquidations withdraws as zero and still clears
    /// the record.
    pub fn withdraw(
        &mut self,
        depositor: Address,
        amount: u64,
        now: Timestamp,
    ) -> KeelResult<WithdrawOutcome> {
        if amount == 0 {
            return Err(KeelError::InvalidAmount {
                amount,
                reason: AmountErrorReason::Zero,
            });
        }
        if !self.deposits.contains_key(&depositor) {
            return Err(KeelError::DepositNotFound { depositor });
        }
        self.settle_issuance(now)?;

        let (compounded, collateral_paid, reward_paid) = self.pending_state(&depositor)?;
        let mut withdrawn = amount.min(compounded);
        let mut remaining = compounded - withdrawn;
        if remaining > 0 && remaining <= DEPOSIT_DUST {
            withdrawn = compounded;
            remaining = 0;
        }
        let pool_total = safe_sub(self.total_deposits, withdrawn)?;

        self.total_deposits = pool_total;
        if remaining == 0 {
            self.deposits.remove(&depositor);
        } else {
            self.deposits.insert(
                depositor,
                PoolDeposit::new(depositor, remaining, &self.accumulator, now),
            );
        }
        self.emit_gains(depositor, collateral_paid, reward_paid);
        self.events.emit(PoolEvent::StabilityWithdrawal {
            asset: self.asset,
            depositor,
            amount: withdrawn,
            remaining_deposit: remaining,
            pool_total,
        });

        Ok(WithdrawOutcome {
            withdrawn,
            remaining,
            collateral_paid,
            reward_paid,
            pool_total,
        })
    }

    /// Flush pending gains without changing the stake.
    ///
    /// The recorded balance is re-based to the compounded value and the
    /// snapshot refreshes; errors if there is nothing to claim. Emission is
    /// settled first and remains settled even when nothing is claimable,
    /// since the claimable amount is only known after settling.
    pub fn claim_gains(&mut self, depositor: Address, now: Timestamp) -> KeelResult<ClaimOutcome> {
        if !self.deposits.contains_key(&depositor) {
            return Err(KeelError::DepositNotFound { depositor });
        }
        self.settle_issuance(now)?;

        let (compounded, collateral_paid, reward_paid) = self.pending_state(&depositor)?;
        if collateral_paid == 0 && reward_paid == 0 {
            return Err(KeelError::NoRewardsToClaim);
        }

        if compounded == 0 {
            self.deposits.remove(&depositor);
        } else {
            self.deposits.insert(
                depositor,
                PoolDeposit::new(depositor, compounded, &self.accumulator, now),
            );
        }
        self.emit_gains(depositor, collateral_paid, reward_paid);

        Ok(ClaimOutcome {
            collateral_paid,
            reward_paid,
            new_deposit: compounded,
        })
    }

    /// Cancel liquidated debt against the pool in exchange for seized
    /// collateral.
    ///
    /// The caller (vault manager) guarantees `debt_to_offset` never exceeds
    /// the pool's holdings; exceeding them is a contract violation. A
    /// post-offset remainder at or below the pool dust threshold is treated
    /// as a full drain: the remainder is socialized and the epoch rolls.
    pub fn offset(
        &mut self,
        debt_to_offset: u64,
        collateral_to_add: u64,
        now: Timestamp,
    ) -> KeelResult<OffsetOutcome> {
        if debt_to_offset == 0 {
            return Ok(OffsetOutcome {
                debt_absorbed: 0,
                collateral_distributed: 0,
                epoch_rolled: false,
                scale_shifted: false,
                pool_total: self.total_deposits,
            });
        }
        if debt_to_offset > self.total_deposits {
            return Err(KeelError::InsufficientPoolBalance {
                available: self.total_deposits,
                required: debt_to_offset,
            });
        }
        self.settle_issuance(now)?;

        let total = self.total_deposits;
        let remainder = total - debt_to_offset;
        let full_drain = remainder <= POOL_DUST;

        let coll_per_unit = self
            .accumulator
            .collateral_per_unit(collateral_to_add, total)?;
        let loss_per_unit = if full_drain {
            self.accumulator.loss_per_unit(total, total)?
        } else {
            self.accumulator.loss_per_unit(debt_to_offset, total)?
        };
        let applied = self.accumulator.apply_offset(coll_per_unit, loss_per_unit)?;

        let pool_total = if full_drain { 0 } else { remainder };
        self.total_deposits = pool_total;

        self.events.emit(PoolEvent::LiquidationOffset {
            asset: self.asset,
            debt_absorbed: debt_to_offset,
            collateral_distributed: collateral_to_add,
            pool_total,
        });
        if applied.scale_shifted {
            self.events.emit(PoolEvent::ScaleShifted {
                asset: self.asset,
                new_scale: self.accumulator.current_scale,
            });
        }
        if applied.epoch_rolled {
            self.events.emit(PoolEvent::EpochRolled {
                asset: self.asset,
                new_epoch: self.accumulator.current_epoch,
            });
        }

        Ok(OffsetOutcome {
            debt_absorbed: debt_to_offset,
            collateral_distributed: collateral_to_add,
            epoch_rolled: applied.epoch_rolled,
            scale_shifted: applied.scale_shifted,
            pool_total,
        })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Compounded balance and pending gains of a depositor, zero for an
    /// unknown one
    fn pending_state(&self, depositor: &Address) -> KeelResult<(u64, u64, u64)> {
        match self.deposits.get(depositor) {
            Some(d) => Ok((
                d.compounded(&self.accumulator)?,
                d.pending_collateral_gain(&self.accumulator)?,
                d.pending_reward_gain(&self.accumulator)?,
            )),
            None => Ok((0, 0, 0)),
        }
    }

    fn emit_gains(&mut self, depositor: Address, collateral_gain: u64, reward_gain: u64) {
        if collateral_gain > 0 || reward_gain > 0 {
            self.events.emit(PoolEvent::GainsClaimed {
                asset: self.asset,
                depositor,
                collateral_gain,
                reward_gain,
            });
        }
    }
}

// ============================================================================
// Persistence
// ============================================================================

/// Durable snapshot of one pool instance's state.
///
/// The issuance source is persisted by the host alongside this (for
/// [`RewardSchedule`] it serializes directly).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PersistedPoolState {
    pub asset: CollateralId,
    pub total_deposits: u64,
    pub p: u128,
    pub current_scale: u64,
    pub current_epoch: u64,
    pub sums: BTreeMap<(u64, u64), SumPair>,
    pub last_collateral_error: u128,
    pub last_loss_error: u128,
    pub last_reward_error: u128,
    pub last_emission_at: Timestamp,
    pub deposits: BTreeMap<Address, PoolDeposit>,
}

impl<I: IssuanceSource> StabilityPoolEngine<I> {
    /// Capture the engine's durable state
    pub fn to_persisted(&self) -> PersistedPoolState {
        PersistedPoolState {
            asset: self.asset,
            total_deposits: self.total_deposits,
            p: self.accumulator.p,
            current_scale: self.accumulator.current_scale,
            current_epoch: self.accumulator.current_epoch,
            sums: self.accumulator.sums.clone(),
            last_collateral_error: self.accumulator.last_collateral_error,
            last_loss_error: self.accumulator.last_loss_error,
            last_reward_error: self.accumulator.last_reward_error,
            last_emission_at: self.last_emission_at,
            deposits: self.deposits.clone(),
        }
    }

    /// Rebuild an engine from durable state and its issuance source
    pub fn from_persisted(state: PersistedPoolState, issuance: I) -> Self {
        Self {
            asset: state.asset,
            total_deposits: state.total_deposits,
            accumulator: RewardAccumulator {
                p: state.p,
                current_scale: state.current_scale,
                current_epoch: state.current_epoch,
                sums: state.sums,
                last_collateral_error: state.last_collateral_error,
                last_loss_error: state.last_loss_error,
                last_reward_error: state.last_reward_error,
            },
            deposits: state.deposits,
            issuance,
            last_emission_at: state.last_emission_at,
            events: EventLog::new(),
        }
    }
}
