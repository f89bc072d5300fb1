//! Store traits for the faucet's shared state.
//!
//! The claim pipeline depends only on these traits. Every method is
//! linearizable per key: a read-modify-write on one key (post id, token,
//! wallet) observes every earlier write to that key. [`MemoryStore`]
//! implements all of them over process-lifetime maps.

pub mod claims;
pub mod error;
pub mod issuance;
pub mod legacy;
pub mod memory;
pub mod post_usage;

pub use claims::ClaimHistoryStore;
pub use error::StoreError;
pub use issuance::{IssuanceLog, ISSUANCE_RETENTION_MS};
pub use legacy::{LegacyTokenRecord, LegacyTokenStore};
pub use memory::MemoryStore;
pub use post_usage::{PostUsageRecord, PostUsageStore};
