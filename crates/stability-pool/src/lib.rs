//! Stability Pool Engine
//!
//! The Stability Pool is the first line of defense in maintaining kUSD's peg.
//! Users deposit kUSD to absorb debt during liquidations, earn collateral
//! from liquidated positions, and accrue continuously-emitted KEEL rewards.
//!
//! ## Key Features
//!
//! - **Deposit/Withdraw**: depositors add and remove kUSD at will; pending
//!   gains are always flushed before any balance change
//! - **Loss Absorption**: liquidated debt is cancelled against the pool in
//!   O(1), without iterating depositors
//! - **Collateral Gains**: seized collateral is shared exactly in proportion
//!   to each stake at the moment of each liquidation
//! - **Reward Emission**: KEEL accrues over time through the same
//!   sum-per-unit-staked bookkeeping
//! - **Epochs/Scales**: a full pool drain opens a new epoch; fixed-point
//!   underflow of the compounding factor is handled by scale shifts
//!
//! ## Algorithm
//!
//! Each depositor stores a snapshot of the pool accumulators
//! `(P, S, G, scale, epoch)` taken at their last interaction. The product
//! `P` compounds every liquidation's retention ratio, so a current balance
//! is `deposit * P / P_snapshot`; the sums `S` and `G` accumulate
//! gain-per-unit-staked, so pending gains are `deposit * (S - S_snapshot)
//! / P_snapshot`. No per-depositor work happens at liquidation time.
//!
//! One engine instance exists per collateral asset; instances share no
//! state. All operations are strictly serialized per instance (`&mut self`)
//! and either complete or fail with no observable side effects.

pub mod accumulator;
pub mod deposits;
pub mod engine;
pub mod issuance;
pub mod registry;


pub use accumulator::{OffsetApplied, RewardAccumulator, SumPair};
pub use deposits::{DepositSnapshot, PoolDeposit};
pub use engine::{
    ClaimOutcome, DepositOutcome, OffsetOutcome, PersistedPoolState, StabilityPoolEngine,
    WithdrawOutcome,
};
pub use issuance::{IssuanceSource, RewardSchedule};
pub use registry::PoolRegistry;
