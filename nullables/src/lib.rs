//! Nullable infrastructure for deterministic testing.
//!
//! The faucet reaches the outside world through three seams: the clock, the
//! ledger RPC capability and the post metadata source. This crate provides
//! test implementations of each that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod ledger;
pub mod metadata;

pub use clock::NullClock;
pub use ledger::{NullLedger, RpcCall, Visibility};
pub use metadata::NullPostMetadata;
