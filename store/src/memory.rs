//! Process-lifetime in-memory store.
//!
//! Thread-safe for use with tokio's multi-threaded runtime. Each map sits
//! behind its own mutex, so every trait method is atomic per call.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use faucet_types::{ClaimRecord, PostId, Timestamp, WalletAddress};

use crate::{
    ClaimHistoryStore, IssuanceLog, ISSUANCE_RETENTION_MS, LegacyTokenRecord, LegacyTokenStore, PostUsageRecord,
    PostUsageStore, StoreError,
};

#[derive(Clone, Debug)]
enum PostState {
    Reserved,
    Used(PostUsageRecord),
}

/// In-memory implementation of every store trait.
pub struct MemoryStore {
    posts: Mutex<HashMap<PostId, PostState>>,
    legacy_tokens: Mutex<HashMap<String, LegacyTokenRecord>>,
    claims: Mutex<HashMap<WalletAddress, Vec<ClaimRecord>>>,
    issuances: Mutex<HashMap<WalletAddress, Timestamp>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Backend("store mutex poisoned".into()))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            posts: Mutex::new(HashMap::new()),
            legacy_tokens: Mutex::new(HashMap::new()),
            claims: Mutex::new(HashMap::new()),
            issuances: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PostUsageStore for MemoryStore {
    fn is_used(&self, post: &PostId) -> Result<bool, StoreError> {
        Ok(matches!(lock(&self.posts)?.get(post), Some(PostState::Used(_))))
    }

    fn get_usage(&self, post: &PostId) -> Result<Option<PostUsageRecord>, StoreError> {
        Ok(match lock(&self.posts)?.get(post) {
            Some(PostState::Used(record)) => Some(record.clone()),
            _ => None,
        })
    }

    fn try_reserve(&self, post: &PostId) -> Result<bool, StoreError> {
        let mut posts = lock(&self.posts)?;
        if posts.contains_key(post) {
            return Ok(false);
        }
        posts.insert(post.clone(), PostState::Reserved);
        Ok(true)
    }

    fn mark_used(&self, post: &PostId, record: PostUsageRecord) -> Result<(), StoreError> {
        let mut posts = lock(&self.posts)?;
        if let Some(PostState::Used(_)) = posts.get(post) {
            return Err(StoreError::Duplicate(post.to_string()));
        }
        posts.insert(post.clone(), PostState::Used(record));
        Ok(())
    }

    fn release(&self, post: &PostId) -> Result<(), StoreError> {
        let mut posts = lock(&self.posts)?;
        if let Some(PostState::Reserved) = posts.get(post) {
            posts.remove(post);
        }
        Ok(())
    }

    fn reset(&self, post: &PostId) -> Result<bool, StoreError> {
        let mut posts = lock(&self.posts)?;
        if let Some(PostState::Used(_)) = posts.get(post) {
            posts.remove(post);
            return Ok(true);
        }
        Ok(false)
    }
}

impl LegacyTokenStore for MemoryStore {
    fn create_token(&self, record: LegacyTokenRecord) -> Result<(), StoreError> {
        let mut tokens = lock(&self.legacy_tokens)?;
        if tokens.contains_key(&record.token) {
            return Err(StoreError::Duplicate("legacy token".into()));
        }
        tokens.insert(record.token.clone(), record);
        Ok(())
    }

    fn lookup_token(&self, token: &str) -> Result<Option<LegacyTokenRecord>, StoreError> {
        Ok(lock(&self.legacy_tokens)?.get(token).cloned())
    }

    fn mark_token_used(&self, token: &str, at: Timestamp) -> Result<(), StoreError> {
        let mut tokens = lock(&self.legacy_tokens)?;
        let record = tokens
            .get_mut(token)
            .ok_or_else(|| StoreError::NotFound("legacy token".into()))?;
        if record.used {
            return Err(StoreError::Duplicate("legacy token".into()));
        }
        record.used = true;
        record.used_at = Some(at);
        Ok(())
    }
}

impl ClaimHistoryStore for MemoryStore {
    fn append_claim(&self, record: ClaimRecord) -> Result<(), StoreError> {
        lock(&self.claims)?
            .entry(record.wallet_address.clone())
            .or_default()
            .push(record);
        Ok(())
    }

    fn claims_for(&self, wallet: &WalletAddress) -> Result<Vec<ClaimRecord>, StoreError> {
        let mut records = lock(&self.claims)?
            .get(wallet)
            .cloned()
            .unwrap_or_default();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    fn last_claim_time(&self, wallet: &WalletAddress) -> Result<Option<Timestamp>, StoreError> {
        Ok(lock(&self.claims)?
            .get(wallet)
            .and_then(|records| records.iter().map(|r| r.timestamp).max()))
    }

    fn claim_count(&self) -> Result<u64, StoreError> {
        Ok(lock(&self.claims)?.values().map(|v| v.len() as u64).sum())
    }
}

impl IssuanceLog for MemoryStore {
    fn last_issuance(&self, wallet: &WalletAddress) -> Result<Option<Timestamp>, StoreError> {
        Ok(lock(&self.issuances)?.get(wallet).copied())
    }

    fn record_issuance(&self, wallet: &WalletAddress, at: Timestamp) -> Result<(), StoreError> {
        let mut issuances = lock(&self.issuances)?;
        issuances.retain(|_, last| !last.has_expired(ISSUANCE_RETENTION_MS, at));
        issuances.insert(wallet.clone(), at);
        Ok(())
    }
}
