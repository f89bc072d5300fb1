//! Transfer Dispatcher: builds, signs and submits faucet transfers.

use std::sync::Arc;

use faucet_crypto::{decode_address, FundingKeypair};
use faucet_types::{Lamports, TxSignature, WalletAddress};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::rpc::LedgerRpc;
use crate::transaction::build_transfer;
use crate::LedgerError;

/// The funding credential as loaded from configuration.
///
/// A missing or undecodable secret does not stop the service; every dispatch
/// reports it until the configuration is fixed.
#[derive(Debug)]
pub enum FundingCredential {
    Loaded(FundingKeypair),
    Missing,
    Invalid(String),
}

impl FundingCredential {
    /// Decode an optional base58 secret.
    pub fn from_secret(secret: Option<&str>) -> Self {
        match secret.map(str::trim).filter(|s| !s.is_empty()) {
            None => FundingCredential::Missing,
            Some(s) => match FundingKeypair::from_base58_secret(s) {
                Ok(kp) => FundingCredential::Loaded(kp),
                Err(e) => FundingCredential::Invalid(e.to_string()),
            },
        }
    }

    pub fn keypair(&self) -> Result<&FundingKeypair, LedgerError> {
        match self {
            FundingCredential::Loaded(kp) => Ok(kp),
            FundingCredential::Missing => Err(LedgerError::NotConfigured(
                "no funding secret configured".into(),
            )),
            FundingCredential::Invalid(reason) => Err(LedgerError::NotConfigured(reason.clone())),
        }
    }

    pub fn address(&self) -> Option<WalletAddress> {
        self.keypair().ok().map(FundingKeypair::address)
    }
}

/// Submits transfers from the funding account.
///
/// Balance check, blockhash fetch and submission run under one mutex, so two
/// claims never both pass the balance check against the same funds.
pub struct TransferDispatcher {
    rpc: Arc<dyn LedgerRpc>,
    credential: FundingCredential,
    submission: Mutex<()>,
}

impl TransferDispatcher {
    pub fn new(rpc: Arc<dyn LedgerRpc>, credential: FundingCredential) -> Self {
        Self {
            rpc,
            credential,
            submission: Mutex::new(()),
        }
    }

    pub fn credential(&self) -> &FundingCredential {
        &self.credential
    }

    pub fn rpc(&self) -> &Arc<dyn LedgerRpc> {
        &self.rpc
    }

    /// Send `amount` to `recipient`. Returns once the ledger accepted the
    /// submission; confirmation is a separate step.
    pub async fn dispatch(
        &self,
        recipient: &WalletAddress,
        amount: Lamports,
    ) -> Result<TxSignature, LedgerError> {
        let recipient_key = decode_address(recipient.as_str())
            .ok_or_else(|| LedgerError::InvalidRecipient(recipient.to_string()))?;
        let funder = self.credential.keypair()?;
        let funder_address = funder.address();

        let _queue = self.submission.lock().await;

        let balance = self.rpc.get_balance(&funder_address).await?;
        if balance < amount {
            warn!(
                funder = %funder_address,
                balance = balance.raw(),
                needed = amount.raw(),
                "funding balance too low"
            );
            return Err(LedgerError::InsufficientFunds {
                needed: amount.raw(),
                available: balance.raw(),
            });
        }

        let blockhash = self.rpc.get_latest_blockhash().await?;
        let transfer = build_transfer(funder, &recipient_key, amount, blockhash.as_str())?;
        let signature = self.rpc.send_transaction(&transfer.wire).await?;

        if signature != transfer.signature {
            warn!(
                expected = %transfer.signature,
                returned = %signature,
                "ledger returned an unexpected transaction reference"
            );
        }
        info!(
            recipient = %recipient,
            amount = amount.raw(),
            signature = %signature,
            "transfer submitted"
        );
        Ok(signature)
    }
}
