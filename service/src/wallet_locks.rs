use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use faucet_types::WalletAddress;

/// Per-wallet locks for the claim pipeline.
/// Claims for different wallets run concurrently.
/// Claims for the same wallet are serialized from eligibility through record.
pub struct WalletLocks {
    locks: Mutex<HashMap<WalletAddress, Arc<Mutex<()>>>>,
}

impl WalletLocks {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn get_wallet_lock(&self, wallet: &WalletAddress) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(wallet.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Wait for exclusive access to `wallet`. Dropping the guard releases it.
    pub async fn lock(&self, wallet: &WalletAddress) -> OwnedMutexGuard<()> {
        let lock = self.get_wallet_lock(wallet).await;
        let guard = lock.lock_owned().await;
        self.cleanup().await;
        guard
    }

    /// Number of wallets with a live lock entry.
    pub async fn tracked_wallets(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Drop lock entries nobody holds or waits on.
    pub async fn cleanup(&self) {
        let mut locks = self.locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}

impl Default for WalletLocks {
    fn default() -> Self {
        Self::new()
    }
}
