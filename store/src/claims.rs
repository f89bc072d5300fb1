//! Claim history storage trait.

use crate::StoreError;
use faucet_types::{ClaimRecord, Timestamp, WalletAddress};

/// Per-wallet, append-only list of successful claims.
pub trait ClaimHistoryStore: Send + Sync {
    fn append_claim(&self, record: ClaimRecord) -> Result<(), StoreError>;

    /// A wallet's claims, most recent first.
    fn claims_for(&self, wallet: &WalletAddress) -> Result<Vec<ClaimRecord>, StoreError>;

    /// The most recent claim timestamp of a wallet.
    fn last_claim_time(&self, wallet: &WalletAddress) -> Result<Option<Timestamp>, StoreError>;

    /// Total number of recorded claims across all wallets.
    fn claim_count(&self) -> Result<u64, StoreError>;
}
