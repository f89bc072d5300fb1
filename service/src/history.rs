//! Claim history view: local records merged with transfers found on the ledger.

use std::collections::HashSet;
use std::sync::Arc;

use faucet_ledger::TransferScanner;
use faucet_store::ClaimHistoryStore;
use faucet_types::{ClaimRecord, Clock, WalletAddress};
use tracing::{debug, warn};

use crate::cache::TtlCache;
use crate::endpoints::LedgerEndpoints;
use crate::ServiceError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimHistory {
    /// Most recent first.
    pub records: Vec<ClaimRecord>,
    /// The ledger could not be read; only local records are shown.
    pub partial: bool,
}

/// Merge local and ledger records, one per transaction, most recent first.
/// A local record wins over a ledger record for the same transaction.
pub fn merge_records(local: Vec<ClaimRecord>, ledger: Vec<ClaimRecord>) -> Vec<ClaimRecord> {
    let mut seen = HashSet::new();
    let mut merged: Vec<ClaimRecord> = local
        .into_iter()
        .chain(ledger)
        .filter(|r| seen.insert(r.tx_signature.clone()))
        .collect();
    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged
}

pub struct HistoryView {
    endpoints: Arc<LedgerEndpoints>,
    scanner: TransferScanner,
    claims: Arc<dyn ClaimHistoryStore>,
    clock: Arc<dyn Clock>,
    cache: TtlCache<ClaimHistory>,
}

impl HistoryView {
    pub fn new(
        endpoints: Arc<LedgerEndpoints>,
        scanner: TransferScanner,
        claims: Arc<dyn ClaimHistoryStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            endpoints,
            scanner,
            claims,
            clock,
            cache: TtlCache::default(),
        }
    }

    /// Partial results are not cached, so the next request retries the ledger.
    pub async fn get(&self, wallet: &WalletAddress) -> Result<ClaimHistory, ServiceError> {
        let now = self.clock.now();
        if let Some(cached) = self.cache.get(wallet, now) {
            debug!(wallet = %wallet, "history served from cache");
            return Ok(cached);
        }

        let local = self.claims.claims_for(wallet)?;
        let history = match self.endpoints.scan_history(&self.scanner, wallet, now).await {
            Ok(ledger) => {
                let history = ClaimHistory {
                    records: merge_records(local, ledger),
                    partial: false,
                };
                self.cache.insert(wallet, history.clone(), now);
                history
            }
            Err(e) => {
                warn!(wallet = %wallet, error = %e, "ledger unavailable, returning local history");
                ClaimHistory {
                    records: merge_records(local, Vec::new()),
                    partial: true,
                }
            }
        };
        Ok(history)
    }

    pub fn invalidate(&self, wallet: &WalletAddress) {
        self.cache.invalidate(wallet);
    }
}
