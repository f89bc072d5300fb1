//! Replay Guard: which posts and legacy tokens have already been spent.

use std::sync::Arc;

use faucet_crypto::random_hex;
use faucet_store::{
    LegacyTokenRecord, LegacyTokenStore, PostUsageRecord, PostUsageStore, StoreError,
};
use faucet_types::{PostId, Timestamp, WalletAddress};
use tracing::{debug, info};

use crate::AttestationError;

/// Random bytes in a legacy opaque token.
const OPAQUE_TOKEN_BYTES: usize = 32;

/// Process-wide record of consumed attestations.
///
/// Revocation is keyed by post id, not by token: any number of tokens may be
/// issued for a post, but only one of them can ever back a successful claim.
#[derive(Clone)]
pub struct ReplayGuard {
    posts: Arc<dyn PostUsageStore>,
    legacy: Arc<dyn LegacyTokenStore>,
}

impl ReplayGuard {
    pub fn new(posts: Arc<dyn PostUsageStore>, legacy: Arc<dyn LegacyTokenStore>) -> Self {
        Self { posts, legacy }
    }

    pub fn is_post_used(&self, post: &PostId) -> Result<bool, StoreError> {
        self.posts.is_used(post)
    }

    pub fn post_usage(&self, post: &PostId) -> Result<Option<PostUsageRecord>, StoreError> {
        self.posts.get_usage(post)
    }

    /// Claim exclusive use of a post for an in-flight claim. `false` if it is
    /// used or another claim holds it.
    pub fn reserve_post(&self, post: &PostId) -> Result<bool, StoreError> {
        self.posts.try_reserve(post)
    }

    /// Record the post as spent. The first write wins; a second one fails
    /// with `StoreError::Duplicate`.
    pub fn mark_post_used(
        &self,
        post: &PostId,
        token: &str,
        wallet: &WalletAddress,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        self.posts.mark_used(
            post,
            PostUsageRecord {
                used_by_token: token.to_string(),
                used_by_wallet: wallet.clone(),
                used_at: now,
            },
        )?;
        info!(post = %post, wallet = %wallet, "post marked used");
        Ok(())
    }

    /// Give a reservation back after a failed claim.
    pub fn release_post(&self, post: &PostId) -> Result<(), StoreError> {
        debug!(post = %post, "post reservation released");
        self.posts.release(post)
    }

    /// Administrative override: forget a post's usage.
    pub fn reset_post(&self, post: &PostId) -> Result<bool, StoreError> {
        let removed = self.posts.reset(post)?;
        info!(post = %post, removed, "post usage reset");
        Ok(removed)
    }

    /// Issue a legacy opaque token for `wallet` and `post`.
    pub fn create_opaque_token(
        &self,
        wallet: &WalletAddress,
        post: &PostId,
        now: Timestamp,
    ) -> Result<String, AttestationError> {
        let token = random_hex(OPAQUE_TOKEN_BYTES)?;
        self.legacy.create_token(LegacyTokenRecord {
            token: token.clone(),
            wallet_address: wallet.clone(),
            post_id: post.clone(),
            created_at: now,
            used: false,
            used_at: None,
        })?;
        Ok(token)
    }

    /// Exact-match lookup of a legacy token.
    pub fn lookup_opaque_token(&self, token: &str) -> Result<Option<LegacyTokenRecord>, StoreError> {
        self.legacy.lookup_token(token)
    }

    pub fn mark_opaque_token_used(&self, token: &str, now: Timestamp) -> Result<(), StoreError> {
        self.legacy.mark_token_used(token, now)
    }
}
