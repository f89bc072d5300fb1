//! Attestation issuance log.

use crate::StoreError;
use faucet_types::{Timestamp, WalletAddress, HOUR_MS};

/// How long an issuance is remembered. Older entries may be discarded.
pub const ISSUANCE_RETENTION_MS: u64 = 24 * HOUR_MS;

/// Remembers when each wallet was last issued an attestation, so re-verification
/// can be rate limited.
pub trait IssuanceLog: Send + Sync {
    fn last_issuance(&self, wallet: &WalletAddress) -> Result<Option<Timestamp>, StoreError>;

    fn record_issuance(&self, wallet: &WalletAddress, at: Timestamp) -> Result<(), StoreError>;
}
