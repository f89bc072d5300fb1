//! The ledger RPC capability.

use async_trait::async_trait;
use faucet_types::{Blockhash, Lamports, TxSignature, WalletAddress};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::LedgerError;

/// One entry of a wallet's signature history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub signature: String,
    /// Block time in epoch seconds, when the ledger knows it.
    pub block_time: Option<i64>,
    /// Execution error, `None` for successful transactions.
    pub err: Option<Value>,
}

/// A confirmed transaction as returned by a transaction lookup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub slot: u64,
    pub block_time: Option<i64>,
    pub fee: Option<u64>,
    pub err: Option<Value>,
    /// Static account keys of the message, in order.
    pub account_keys: Vec<String>,
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,
    pub log_messages: Vec<String>,
}

impl TransactionDetails {
    /// Position of `wallet` among the account keys.
    pub fn account_index(&self, wallet: &WalletAddress) -> Option<usize> {
        self.account_keys.iter().position(|k| k == wallet.as_str())
    }

    pub fn involves(&self, wallet: &WalletAddress) -> bool {
        self.account_index(wallet).is_some()
    }

    /// Lamports credited to `wallet` by this transaction. `None` if the wallet
    /// is not involved, balances are missing, or the balance went down.
    pub fn credited_to(&self, wallet: &WalletAddress) -> Option<u64> {
        let idx = self.account_index(wallet)?;
        let pre = *self.pre_balances.get(idx)?;
        let post = *self.post_balances.get(idx)?;
        post.checked_sub(pre)
    }
}

/// Confirmation status of a signature, without the transaction body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SignatureStatus {
    pub slot: u64,
    /// `None` once the block is rooted (finalized).
    pub confirmations: Option<u64>,
    pub err: Option<Value>,
    pub confirmation_status: Option<String>,
}

/// Narrow view of a ledger endpoint.
///
/// Lookups that may legitimately miss return `Ok(None)`; `Err` always means
/// the call itself failed.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// URL (or name) of the endpoint, for logs and status.
    fn endpoint(&self) -> &str;

    async fn get_balance(&self, address: &WalletAddress) -> Result<Lamports, LedgerError>;

    async fn get_latest_blockhash(&self) -> Result<Blockhash, LedgerError>;

    /// Submit a serialized, signed transaction. Returns the ledger's reference for it.
    async fn send_transaction(&self, wire: &[u8]) -> Result<TxSignature, LedgerError>;

    /// Typed transaction lookup.
    async fn get_transaction(
        &self,
        signature: &TxSignature,
    ) -> Result<Option<TransactionDetails>, LedgerError>;

    /// The same lookup through the endpoint's lowest-level (parsed JSON) query form.
    async fn get_transaction_raw(
        &self,
        signature: &TxSignature,
    ) -> Result<Option<TransactionDetails>, LedgerError>;

    async fn get_signature_status(
        &self,
        signature: &TxSignature,
    ) -> Result<Option<SignatureStatus>, LedgerError>;

    /// Most recent signatures involving `address`, newest first.
    async fn get_signatures_for_address(
        &self,
        address: &WalletAddress,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, LedgerError>;
}
