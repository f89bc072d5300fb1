//! Post usage storage trait.

use crate::StoreError;
use faucet_types::{PostId, Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

/// Who consumed a post, and when.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUsageRecord {
    pub used_by_token: String,
    pub used_by_wallet: WalletAddress,
    pub used_at: Timestamp,
}

/// Tracks which social posts have backed a successful claim.
///
/// A post moves from free to reserved (a claim is in flight) to used. Only
/// the used state is visible through [`is_used`](Self::is_used); a reservation
/// blocks a second claim but not the issuance of attestations.
pub trait PostUsageStore: Send + Sync {
    /// Whether the post has backed a successful claim.
    fn is_used(&self, post: &PostId) -> Result<bool, StoreError>;

    /// The usage record of a consumed post.
    fn get_usage(&self, post: &PostId) -> Result<Option<PostUsageRecord>, StoreError>;

    /// Reserve a free post for an in-flight claim.
    ///
    /// Returns `false` if the post is already used or reserved.
    fn try_reserve(&self, post: &PostId) -> Result<bool, StoreError>;

    /// Mark the post used. The first write wins: a post that is already used
    /// yields `StoreError::Duplicate` and keeps its original record.
    fn mark_used(&self, post: &PostId, record: PostUsageRecord) -> Result<(), StoreError>;

    /// Drop an in-flight reservation. Used posts are left untouched.
    fn release(&self, post: &PostId) -> Result<(), StoreError>;

    /// Administrative override: forget a used post. A reservation held by an
    /// in-flight claim is left in place. Returns whether a record was removed.
    fn reset(&self, post: &PostId) -> Result<bool, StoreError>;
}
