//! Ordered ledger endpoints with fallback.

use std::sync::Arc;

use faucet_ledger::{LedgerError, LedgerRpc, TransferScanner};
use faucet_types::{ClaimRecord, Timestamp, WalletAddress};
use tracing::warn;

use crate::ServiceError;

/// Ledger endpoints, primary first.
///
/// Reads that tolerate any endpoint (history scans) fall through the list;
/// submissions and confirmations use the primary only, so a transaction is
/// looked up where it was sent.
pub struct LedgerEndpoints {
    endpoints: Vec<Arc<dyn LedgerRpc>>,
}

impl LedgerEndpoints {
    pub fn new(endpoints: Vec<Arc<dyn LedgerRpc>>) -> Result<Self, ServiceError> {
        if endpoints.is_empty() {
            return Err(ServiceError::Configuration(
                "no ledger endpoints configured".into(),
            ));
        }
        Ok(Self { endpoints })
    }

    pub fn primary(&self) -> &Arc<dyn LedgerRpc> {
        &self.endpoints[0]
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Scan `wallet`'s history on the first endpoint that answers.
    /// Fails with the last error only when every endpoint failed.
    pub async fn scan_history(
        &self,
        scanner: &TransferScanner,
        wallet: &WalletAddress,
        now: Timestamp,
    ) -> Result<Vec<ClaimRecord>, LedgerError> {
        let mut last_error = None;
        for rpc in &self.endpoints {
            match scanner.scan(rpc.as_ref(), wallet, now).await {
                Ok(records) => return Ok(records),
                Err(e) => {
                    warn!(endpoint = rpc.endpoint(), wallet = %wallet, error = %e, "ledger endpoint failed, trying next");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| LedgerError::Unreachable("no ledger endpoints".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_endpoint_list_is_a_configuration_error() {
        assert!(matches!(
            LedgerEndpoints::new(Vec::new()),
            Err(ServiceError::Configuration(_))
        ));
    }
}
