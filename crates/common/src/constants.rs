//! Protocol Constants
//!
//! All magic numbers and configuration values for the Keel protocol.
//! The stability-pool parameters follow Liquity's battle-tested choices.
//!
//! # Network Configuration
//!
//! Use feature flags to compile for different networks:
//! - `mainnet` - Production values (full emission rate and supply cap)
//! - Default (no feature) - Testnet values (reduced emission for testing)

/// Stable token metadata
pub mod token {
    /// Token name
    pub const NAME: &str = "Keel USD";
    /// Token symbol
    pub const SYMBOL: &str = "kUSD";
    /// Decimal places
    pub const DECIMALS: u8 = 8;
    /// One unit with decimals (1 kUSD = 100_000_000 base units)
    pub const ONE: u64 = 100_000_000;
}

/// Emission/reward token metadata
pub mod reward_token {
    /// Token name
    pub const NAME: &str = "Keel";
    /// Token symbol
    pub const SYMBOL: &str = "KEEL";
    /// Decimal places
    pub const DECIMALS: u8 = 8;
    /// One unit with decimals
    pub const ONE: u64 = 100_000_000;
}

/// Stability Pool configuration
pub mod stability_pool {
    /// Fixed-point scale for the P/S/G accumulators (1e18)
    pub const DECIMAL_PRECISION: u128 = 1_000_000_000_000_000_000;

    /// Renormalization factor applied to P on a scale shift (1e9)
    pub const SCALE_SHIFT: u128 = 1_000_000_000;

    /// P values below this trigger a scale shift (1e9 in 1e18 scale)
    pub const P_RENORM_THRESHOLD: u128 = DECIMAL_PRECISION / SCALE_SHIFT;

    /// Post-withdrawal remainders at or below this are flushed with the
    /// withdrawal rather than left as an unspendable stub
    pub const DEPOSIT_DUST: u64 = 1_000;

    /// An offset leaving at most this much in the pool is treated as a full
    /// drain; the remainder is socialized and the epoch rolls over
    pub const POOL_DUST: u64 = 1_000;
}

/// Reward emission configuration
pub mod emission {
    use super::reward_token::ONE;

    /// Seconds per week, the emission rate's time base
    pub const SECONDS_PER_WEEK: u64 = 7 * 24 * 60 * 60;

    /// Default KEEL emitted per week to stability depositors
    /// - Mainnet: 250,000 KEEL
    /// - Testnet: 1,000 KEEL (keeps test balances small)
    #[cfg(feature = "mainnet")]
    pub const DEFAULT_WEEKLY_REWARD: u64 = 250_000 * ONE;
    #[cfg(not(feature = "mainnet"))]
    pub const DEFAULT_WEEKLY_REWARD: u64 = 1_000 * ONE;

    /// Total KEEL ever mintable to the stability pool
    /// - Mainnet: 32,000,000 KEEL
    /// - Testnet: 100,000 KEEL
    #[cfg(feature = "mainnet")]
    pub const SUPPLY_CAP: u64 = 32_000_000 * ONE;
    #[cfg(not(feature = "mainnet"))]
    pub const SUPPLY_CAP: u64 = 100_000 * ONE;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_relationships() {
        // The renormalization threshold must be exactly one scale shift
        // below full precision, or compounded-deposit reads across a single
        // scale change would be mis-scaled.
        assert_eq!(
            stability_pool::P_RENORM_THRESHOLD * stability_pool::SCALE_SHIFT,
            stability_pool::DECIMAL_PRECISION
        );
    }

    #[test]
    fn test_dust_thresholds_are_subtoken() {
        assert!(stability_pool::DEPOSIT_DUST < token::ONE);
        assert!(stability_pool::POOL_DUST < token::ONE);
    }

    #[test]
    fn test_emission_cap_exceeds_weekly_rate() {
        assert!(emission::SUPPLY_CAP >= emission::DEFAULT_WEEKLY_REWARD);
    }
}
