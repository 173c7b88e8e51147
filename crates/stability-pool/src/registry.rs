//! Multi-Collateral Pool Registry
//!
//! One stability pool exists per collateral asset; pools share no state and
//! never interact. The registry owns them and routes by [`CollateralId`].

use keel_common::errors::{KeelError, KeelResult};
use keel_common::types::{CollateralId, Timestamp};
use keel_common::{BTreeMap, Vec};

use crate::engine::StabilityPoolEngine;
use crate::issuance::{IssuanceSource, RewardSchedule};

/// Registry of per-asset stability pools
#[derive(Debug, Clone, Default)]
pub struct PoolRegistry<I = RewardSchedule> {
    pools: BTreeMap<CollateralId, StabilityPoolEngine<I>>,
}

impl<I: IssuanceSource> PoolRegistry<I> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            pools: BTreeMap::new(),
        }
    }

    /// Register a pool for a new collateral asset
    pub fn register(&mut self, asset: CollateralId, issuance: I, now: Timestamp) -> KeelResult<()> {
        if self.pools.contains_key(&asset) {
            return Err(KeelError::PoolAlreadyRegistered { asset });
        }
        self.pools
            .insert(asset, StabilityPoolEngine::new(asset, issuance, now));
        Ok(())
    }

    /// The pool for an asset, if registered
    pub fn engine(&self, asset: &CollateralId) -> KeelResult<&StabilityPoolEngine<I>> {
        self.pools
            .get(asset)
            .ok_or(KeelError::PoolNotFound { asset: *asset })
    }

    /// Mutable access to the pool for an asset
    pub fn engine_mut(&mut self, asset: &CollateralId) -> KeelResult<&mut StabilityPoolEngine<I>> {
        self.pools
            .get_mut(asset)
            .ok_or(KeelError::PoolNotFound { asset: *asset })
    }

    /// All registered collateral assets
    pub fn assets(&self) -> Vec<CollateralId> {
        self.pools.keys().copied().collect()
    }

    /// Number of registered pools
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Whether no pools are registered
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_KUSD: u64 = 100_000_000;

    fn schedule() -> RewardSchedule {
        RewardSchedule::new(700 * ONE_KUSD, 1_000_000 * ONE_KUSD, 0)
    }

    #[test]
    fn test_register_and_route() {
        let mut registry = PoolRegistry::new();
        let btc = CollateralId::from_symbol("BTC");
        let eth = CollateralId::from_symbol("ETH");

        registry.register(btc, schedule(), 0).unwrap();
        registry.register(eth, schedule(), 0).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.assets(), vec![btc, eth]);

        assert_eq!(registry.engine(&btc).unwrap().asset(), btc);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = PoolRegistry::new();
        let btc = CollateralId::from_symbol("BTC");

        registry.register(btc, schedule(), 0).unwrap();
        assert_eq!(
            registry.register(btc, schedule(), 0),
            Err(KeelError::PoolAlreadyRegistered { asset: btc })
        );
    }

    #[test]
    fn test_unknown_asset_rejected() {
        let mut registry: PoolRegistry = PoolRegistry::new();
        let doge = CollateralId::from_symbol("DOGE");
        assert_eq!(
            registry.engine(&doge).map(|_| ()),
            Err(KeelError::PoolNotFound { asset: doge })
        );
    }

    #[test]
    fn test_pools_are_isolated() {
        let mut registry = PoolRegistry::new();
        let btc = CollateralId::from_symbol("BTC");
        let eth = CollateralId::from_symbol("ETH");
        registry.register(btc, schedule(), 0).unwrap();
        registry.register(eth, schedule(), 0).unwrap();

        let alice = [1u8; 32];
        registry
            .engine_mut(&btc)
            .unwrap()
            .deposit(alice, 1_000 * ONE_KUSD, 0)
            .unwrap();
        registry
            .engine_mut(&btc)
            .unwrap()
            .offset(500 * ONE_KUSD, 10 * ONE_KUSD, 0)
            .unwrap();

        // The ETH pool never saw any of it
        let eth_pool = registry.engine(&eth).unwrap();
        assert_eq!(eth_pool.total_deposits(), 0);
        assert_eq!(eth_pool.accumulator().current_epoch, 0);
        assert_eq!(
            eth_pool.compounded_deposit(&alice).unwrap(),
            0
        );
    }
}
