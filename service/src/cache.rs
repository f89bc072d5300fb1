//! Short-lived per-wallet result cache.
//!
//! Entries are snapshots stamped with the time they were computed. Writers to
//! the same key race and the last write wins; entries are never trusted past
//! their TTL. Every insert sweeps out expired entries, so the map only holds
//! wallets seen within the last TTL.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use faucet_types::{Timestamp, WalletAddress};

/// How long a cached eligibility or history result stays valid.
pub const CACHE_TTL_MS: u64 = 30_000;

pub struct TtlCache<V> {
    entries: Mutex<HashMap<WalletAddress, (V, Timestamp)>>,
    ttl_ms: u64,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl_ms,
        }
    }

    // A poisoned cache only ever held complete snapshots, so keep using it.
    fn entries(&self) -> MutexGuard<'_, HashMap<WalletAddress, (V, Timestamp)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The cached value for `wallet`, if it is younger than the TTL at `now`.
    pub fn get(&self, wallet: &WalletAddress, now: Timestamp) -> Option<V> {
        let mut entries = self.entries();
        match entries.get(wallet) {
            Some((value, cached_at)) if !cached_at.has_expired(self.ttl_ms, now) => {
                Some(value.clone())
            }
            Some(_) => {
                entries.remove(wallet);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, wallet: &WalletAddress, value: V, now: Timestamp) {
        let ttl_ms = self.ttl_ms;
        let mut entries = self.entries();
        entries.retain(|_, (_, cached_at)| !cached_at.has_expired(ttl_ms, now));
        entries.insert(wallet.clone(), (value, now));
    }

    pub fn invalidate(&self, wallet: &WalletAddress) {
        self.entries().remove(wallet);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(CACHE_TTL_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> WalletAddress {
        WalletAddress::parse("3".repeat(40)).unwrap()
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = TtlCache::new(1_000);
        let t0 = Timestamp::from_millis(10_000);
        cache.insert(&wallet(), 7u32, t0);

        assert_eq!(cache.get(&wallet(), t0.plus_millis(999)), Some(7));
        assert_eq!(cache.get(&wallet(), t0.plus_millis(1_000)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn insert_sweeps_expired_wallets() {
        let cache = TtlCache::new(1_000);
        let t0 = Timestamp::from_millis(10_000);
        for i in 1..=2_000u32 {
            let raw = format!("{:z>40}", i.to_string().replace('0', "A"));
            cache.insert(&WalletAddress::parse(raw).unwrap(), i, t0);
        }
        assert_eq!(cache.len(), 2_000);

        let later = t0.plus_millis(100_000);
        cache.insert(&wallet(), 0, later);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&wallet(), later), Some(0));
    }

    #[test]
    fn insert_keeps_live_entries() {
        let cache = TtlCache::new(1_000);
        let t0 = Timestamp::from_millis(10_000);
        let other = WalletAddress::parse("4".repeat(40)).unwrap();
        cache.insert(&other, 1, t0);
        cache.insert(&wallet(), 2, t0.plus_millis(999));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&other, t0.plus_millis(999)), Some(1));
    }

    #[test]
    fn invalidate_drops_entry() {
        let cache = TtlCache::default();
        let t0 = Timestamp::from_millis(1);
        cache.insert(&wallet(), "snapshot", t0);
        cache.invalidate(&wallet());
        assert_eq!(cache.get(&wallet(), t0), None);
    }

    #[test]
    fn last_write_wins() {
        let cache = TtlCache::default();
        let t0 = Timestamp::from_millis(1);
        cache.insert(&wallet(), 1, t0);
        cache.insert(&wallet(), 2, t0);
        assert_eq!(cache.get(&wallet(), t0), Some(2));
        assert_eq!(cache.len(), 1);
    }
}
