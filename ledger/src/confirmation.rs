//! Confirmation Verifier.
//!
//! Confirms a transaction by trying independent lookup methods in a fixed
//! priority order and stopping at the first one that finds the transaction:
//!
//! 1. direct lookup (`getTransaction`, typed)
//! 2. raw query (`getTransaction`, parsed JSON)
//! 3. status check (`getSignatureStatuses`)
//!
//! Each method gets a bounded number of attempts with a fixed backoff, retried
//! only while the call fails in transport or the transaction is not yet visible.

use std::sync::Arc;
use std::time::Duration;

use faucet_types::{TxSignature, WalletAddress};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::retry::retry;
use crate::rpc::{LedgerRpc, SignatureStatus, TransactionDetails};
use crate::LedgerError;

/// Attempts per method.
pub const DEFAULT_ATTEMPTS: usize = 3;

/// Fixed delay between attempts of one method.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(200);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationMethod {
    DirectLookup,
    RawQuery,
    StatusCheck,
}

impl VerificationMethod {
    pub const ORDER: [VerificationMethod; 3] = [
        VerificationMethod::DirectLookup,
        VerificationMethod::RawQuery,
        VerificationMethod::StatusCheck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationMethod::DirectLookup => "direct-lookup",
            VerificationMethod::RawQuery => "raw-query",
            VerificationMethod::StatusCheck => "status-check",
        }
    }
}

impl std::fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the deciding method saw.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationDetails {
    pub slot: Option<u64>,
    pub block_time: Option<i64>,
    pub fee: Option<u64>,
    pub err: Option<Value>,
    pub is_for_wallet: Option<bool>,
    pub confirmations: Option<u64>,
    pub confirmation_status: Option<String>,
}

impl VerificationDetails {
    fn from_transaction(tx: &TransactionDetails, is_for_wallet: bool) -> Self {
        Self {
            slot: Some(tx.slot),
            block_time: tx.block_time,
            fee: tx.fee,
            err: tx.err.clone(),
            is_for_wallet: Some(is_for_wallet),
            ..Default::default()
        }
    }

    fn from_status(status: &SignatureStatus) -> Self {
        Self {
            slot: Some(status.slot),
            err: status.err.clone(),
            confirmations: status.confirmations,
            confirmation_status: status.confirmation_status.clone(),
            ..Default::default()
        }
    }
}

/// Result of one verification run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VerificationReport {
    pub found: bool,
    pub success: bool,
    /// The method that found the transaction; `None` when nothing did.
    pub method: Option<VerificationMethod>,
    /// Total RPC calls made across all methods.
    pub attempts: usize,
    pub details: Option<VerificationDetails>,
}

/// How the claim pipeline should read a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// Positively confirmed for the wallet.
    Confirmed,
    /// Found on the ledger but failed or unrelated to the wallet.
    Failed,
    /// No method could find the transaction.
    Unverified,
}

impl VerificationReport {
    pub fn outcome(&self) -> ConfirmationOutcome {
        match (self.found, self.success) {
            (true, true) => ConfirmationOutcome::Confirmed,
            (true, false) => ConfirmationOutcome::Failed,
            (false, _) => ConfirmationOutcome::Unverified,
        }
    }
}

/// Verifies transactions against one ledger endpoint.
pub struct ConfirmationVerifier {
    rpc: Arc<dyn LedgerRpc>,
    attempts: usize,
    backoff: Duration,
}

fn retryable(e: &LedgerError) -> bool {
    e.is_transport() || matches!(e, LedgerError::NotFound(_))
}

impl ConfirmationVerifier {
    pub fn new(rpc: Arc<dyn LedgerRpc>) -> Self {
        Self::with_schedule(rpc, DEFAULT_ATTEMPTS, DEFAULT_BACKOFF)
    }

    /// Custom retry schedule (tests use a zero backoff). `attempts` is
    /// clamped to `1..=DEFAULT_ATTEMPTS` per method.
    pub fn with_schedule(rpc: Arc<dyn LedgerRpc>, attempts: usize, backoff: Duration) -> Self {
        Self {
            rpc,
            attempts: attempts.clamp(1, DEFAULT_ATTEMPTS),
            backoff,
        }
    }

    /// Run the method sequence for `signature` on behalf of `wallet`.
    pub async fn verify(&self, signature: &TxSignature, wallet: &WalletAddress) -> VerificationReport {
        let mut total_attempts = 0;

        for method in VerificationMethod::ORDER {
            let (result, made) = match method {
                VerificationMethod::DirectLookup | VerificationMethod::RawQuery => {
                    let (result, made) = self.lookup_transaction(method, signature).await;
                    (result.map(Found::Transaction), made)
                }
                VerificationMethod::StatusCheck => {
                    let (result, made) = self.check_status(signature).await;
                    (result.map(Found::Status), made)
                }
            };
            total_attempts += made;

            match result {
                Ok(found) => {
                    let report = found.into_report(method, wallet, total_attempts);
                    info!(
                        signature = %signature,
                        method = %method,
                        success = report.success,
                        attempts = total_attempts,
                        "transaction located"
                    );
                    return report;
                }
                Err(LedgerError::NotFound(_)) => {
                    debug!(signature = %signature, method = %method, "not found, trying next method");
                }
                Err(e) => {
                    warn!(signature = %signature, method = %method, error = %e, "verification method failed");
                }
            }
        }

        warn!(signature = %signature, attempts = total_attempts, "transaction unverified by every method");
        VerificationReport {
            found: false,
            success: false,
            method: None,
            attempts: total_attempts,
            details: None,
        }
    }

    async fn lookup_transaction(
        &self,
        method: VerificationMethod,
        signature: &TxSignature,
    ) -> (Result<TransactionDetails, LedgerError>, usize) {
        retry(self.attempts, self.backoff, retryable, move || async move {
            let found = match method {
                VerificationMethod::RawQuery => self.rpc.get_transaction_raw(signature).await?,
                _ => self.rpc.get_transaction(signature).await?,
            };
            found.ok_or_else(|| LedgerError::NotFound(signature.to_string()))
        })
        .await
    }

    async fn check_status(
        &self,
        signature: &TxSignature,
    ) -> (Result<SignatureStatus, LedgerError>, usize) {
        retry(self.attempts, self.backoff, retryable, move || async move {
            self.rpc
                .get_signature_status(signature)
                .await?
                .ok_or_else(|| LedgerError::NotFound(signature.to_string()))
        })
        .await
    }
}

enum Found {
    Transaction(TransactionDetails),
    Status(SignatureStatus),
}

impl Found {
    fn into_report(
        self,
        method: VerificationMethod,
        wallet: &WalletAddress,
        attempts: usize,
    ) -> VerificationReport {
        let (success, details) = match self {
            Found::Transaction(tx) => {
                let is_for_wallet = tx.involves(wallet);
                let success = tx.err.is_none() && is_for_wallet;
                (success, VerificationDetails::from_transaction(&tx, is_for_wallet))
            }
            Found::Status(status) => {
                let confirmed =
                    status.confirmations.is_some() || status.confirmation_status.is_some();
                let success = status.err.is_none() && confirmed;
                (success, VerificationDetails::from_status(&status))
            }
        };
        VerificationReport {
            found: true,
            success,
            method: Some(method),
            attempts,
            details: Some(details),
        }
    }
}
