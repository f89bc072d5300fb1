//! Legacy opaque token storage trait.

use crate::StoreError;
use faucet_types::{PostId, Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

/// An opaque attestation token from before tokens were signed.
///
/// Never deleted; only `used` and `used_at` ever change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTokenRecord {
    pub token: String,
    pub wallet_address: WalletAddress,
    pub post_id: PostId,
    pub created_at: Timestamp,
    pub used: bool,
    pub used_at: Option<Timestamp>,
}

/// Exact-match lookup of legacy opaque tokens.
pub trait LegacyTokenStore: Send + Sync {
    /// Store a freshly issued token. Fails with `Duplicate` on a token collision.
    fn create_token(&self, record: LegacyTokenRecord) -> Result<(), StoreError>;

    fn lookup_token(&self, token: &str) -> Result<Option<LegacyTokenRecord>, StoreError>;

    /// Mark a token consumed. `NotFound` for unknown tokens, `Duplicate` if
    /// it was already consumed.
    fn mark_token_used(&self, token: &str, at: Timestamp) -> Result<(), StoreError>;
}
