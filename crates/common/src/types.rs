//! Core Types for the Keel Protocol
//!
//! Fundamental identifiers shared across the protocol crates.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Type alias for addresses (32-byte hash)
pub type Address = [u8; 32];

/// Type alias for timestamps (seconds)
pub type Timestamp = u64;

/// Strongly-typed identifier for a collateral asset.
///
/// Every Stability Pool instance is parameterized by exactly one collateral
/// asset; pools for different assets share no state. Using a newtype rather
/// than a bare byte array keeps asset dispatch typed at the registry seam.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct CollateralId(pub [u8; 32]);

impl CollateralId {
    /// Wrap a raw 32-byte asset identifier
    pub const fn new(id: [u8; 32]) -> Self {
        Self(id)
    }

    /// Build an identifier from an ASCII symbol, zero-padded.
    ///
    /// Symbols longer than 32 bytes are truncated.
    pub fn from_symbol(symbol: &str) -> Self {
        let mut id = [0u8; 32];
        let bytes = symbol.as_bytes();
        let len = bytes.len().min(32);
        id[..len].copy_from_slice(&bytes[..len]);
        Self(id)
    }

    /// Raw bytes of the identifier
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_symbol_padding() {
        let id = CollateralId::from_symbol("BTC");
        assert_eq!(&id.as_bytes()[..3], b"BTC");
        assert!(id.as_bytes()[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_distinct_symbols_distinct_ids() {
        assert_ne!(
            CollateralId::from_symbol("BTC"),
            CollateralId::from_symbol("stBTC")
        );
    }

    #[test]
    fn test_ordering_is_stable() {
        // CollateralId keys a BTreeMap in the pool registry
        let a = CollateralId::new([1u8; 32]);
        let b = CollateralId::new([2u8; 32]);
        assert!(a < b);
    }
}
