//! Keel Common Library
//!
//! Shared types, constants, and utilities for the Keel protocol crates.
//!
//! Keel is a collateralized-debt-position stablecoin system: users lock
//! collateral, mint kUSD against it, and a pooled Stability Pool absorbs
//! undercollateralized positions via liquidation. This crate provides the
//! foundation the accounting crates build on:
//!
//! - **Constants**: token metadata, fixed-point scale factors, dust
//!   thresholds, emission parameters
//! - **Errors**: typed error enum with stable error codes
//! - **Types**: addresses, timestamps, collateral-asset identifiers
//! - **Math**: checked arithmetic and wide-intermediate mul/div helpers
//! - **Events**: protocol events for off-chain indexing
//!
//! This crate is `no_std` compatible for embedding in constrained hosts when
//! built without the default `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export collection types for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::{collections::BTreeMap, string::String, vec::Vec};
#[cfg(feature = "std")]
pub use std::{collections::BTreeMap, string::String, vec::Vec};

pub mod constants;
pub mod errors;
pub mod events;
pub mod math;
pub mod types;

pub use errors::{KeelError, KeelResult};
