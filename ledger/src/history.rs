//! Reconstruction of past faucet transfers from a wallet's ledger history.

use faucet_types::{ClaimRecord, Lamports, Timestamp, TxSignature, WalletAddress};
use tracing::debug;

use crate::rpc::LedgerRpc;
use crate::LedgerError;

/// How many of a wallet's most recent signatures are inspected.
pub const HISTORY_SCAN_LIMIT: usize = 20;

/// Tolerance, in percent, around the claim amount for a credit to count as a
/// faucet transfer.
pub const AMOUNT_TOLERANCE_PERCENT: u64 = 20;

/// Finds incoming transfers that look like faucet disbursements.
///
/// A transfer qualifies when it executed without error, involves the wallet,
/// and credits it an amount within the tolerance band around the claim amount.
/// This is a heuristic: the ledger does not mark faucet transfers.
#[derive(Clone, Copy, Debug)]
pub struct TransferScanner {
    claim_amount: Lamports,
    limit: usize,
}

impl TransferScanner {
    pub fn new(claim_amount: Lamports) -> Self {
        Self {
            claim_amount,
            limit: HISTORY_SCAN_LIMIT,
        }
    }

    /// Faucet-like transfers to `wallet`, most recent first.
    ///
    /// Fails only if the signature listing itself fails; a transaction that
    /// cannot be fetched is skipped. A missing block time reads as `now`.
    pub async fn scan(
        &self,
        rpc: &dyn LedgerRpc,
        wallet: &WalletAddress,
        now: Timestamp,
    ) -> Result<Vec<ClaimRecord>, LedgerError> {
        let signatures = rpc.get_signatures_for_address(wallet, self.limit).await?;
        let mut records = Vec::new();

        for info in signatures.into_iter().take(self.limit) {
            if info.err.is_some() {
                continue;
            }
            let Ok(signature) = TxSignature::parse(info.signature.as_str()) else {
                continue;
            };
            let tx = match rpc.get_transaction(&signature).await {
                Ok(Some(tx)) => tx,
                Ok(None) => continue,
                Err(e) => {
                    debug!(signature = %signature, error = %e, "skipping unreadable transaction");
                    continue;
                }
            };
            if tx.err.is_some() {
                continue;
            }
            let Some(credited) = tx.credited_to(wallet) else {
                continue;
            };
            if !self
                .claim_amount
                .within_tolerance(credited, AMOUNT_TOLERANCE_PERCENT)
            {
                continue;
            }
            let timestamp = info
                .block_time
                .or(tx.block_time)
                .and_then(|secs| u64::try_from(secs).ok())
                .map(Timestamp::from_secs)
                .unwrap_or(now);
            records.push(ClaimRecord::new(
                wallet.clone(),
                timestamp,
                Lamports::new(credited),
                signature,
            ));
        }

        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        debug!(wallet = %wallet, matches = records.len(), "ledger history scanned");
        Ok(records)
    }
}
