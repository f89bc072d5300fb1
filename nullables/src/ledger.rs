//! Nullable ledger: a scripted, in-memory stand-in for a ledger endpoint.
//!
//! Submitted transfers are decoded and applied to in-memory balances, and can
//! be made visible to all lookup methods, to the status check only, or to none.

use async_trait::async_trait;
use faucet_crypto::base58;
use faucet_ledger::{LedgerError, LedgerRpc, SignatureInfo, SignatureStatus, TransactionDetails};
use faucet_types::{Blockhash, Clock, Lamports, Timestamp, TxSignature, WalletAddress};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Fee charged to the funder per transfer.
pub const TRANSFER_FEE: u64 = 5_000;

/// Every call the ledger received, for assertions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RpcCall {
    GetBalance,
    GetLatestBlockhash,
    SendTransaction,
    GetTransaction,
    GetTransactionRaw,
    GetSignatureStatus,
    GetSignaturesForAddress,
}

/// How a submitted transfer becomes visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    /// Visible to every lookup method.
    Full,
    /// Only the status check sees it.
    StatusOnly,
    /// Invisible to every method.
    Hidden,
    /// Executed with an error.
    Failed,
}

#[derive(Default)]
struct LedgerState {
    balances: HashMap<String, u64>,
    transactions: HashMap<String, TransactionDetails>,
    raw_only: HashMap<String, TransactionDetails>,
    statuses: HashMap<String, SignatureStatus>,
    history: HashMap<String, Vec<SignatureInfo>>,
    submitted: Vec<TxSignature>,
    calls: Vec<RpcCall>,
    slot: u64,
}

/// A scripted ledger endpoint for testing.
pub struct NullLedger {
    name: String,
    state: Mutex<LedgerState>,
    offline: AtomicBool,
    reject_submissions: AtomicBool,
    visibility: Mutex<Visibility>,
    clock: Option<Arc<dyn Clock>>,
}

impl NullLedger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(LedgerState {
                slot: 1_000,
                ..Default::default()
            }),
            offline: AtomicBool::new(false),
            reject_submissions: AtomicBool::new(false),
            visibility: Mutex::new(Visibility::Full),
            clock: None,
        }
    }

    /// Stamp transactions with block times from `clock`. Without a clock
    /// block times are absent.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Every call fails with `Unreachable` while offline.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_reject_submissions(&self, reject: bool) {
        self.reject_submissions.store(reject, Ordering::SeqCst);
    }

    pub fn set_visibility(&self, visibility: Visibility) {
        *self.visibility.lock().unwrap() = visibility;
    }

    pub fn set_balance(&self, address: &WalletAddress, lamports: u64) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert(address.to_string(), lamports);
    }

    pub fn balance_of(&self, address: &WalletAddress) -> u64 {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(address.as_str())
            .copied()
            .unwrap_or(0)
    }

    /// Make a transaction visible to direct and raw lookups.
    pub fn insert_transaction(&self, signature: &TxSignature, details: TransactionDetails) {
        self.state
            .lock()
            .unwrap()
            .transactions
            .insert(signature.to_string(), details);
    }

    /// Make a transaction visible to the raw lookup only.
    pub fn insert_raw_only(&self, signature: &TxSignature, details: TransactionDetails) {
        self.state
            .lock()
            .unwrap()
            .raw_only
            .insert(signature.to_string(), details);
    }

    pub fn insert_status(&self, signature: &TxSignature, status: SignatureStatus) {
        self.state
            .lock()
            .unwrap()
            .statuses
            .insert(signature.to_string(), status);
    }

    /// Prepend an entry to a wallet's signature history (newest first).
    pub fn push_history(&self, address: &WalletAddress, info: SignatureInfo) {
        self.state
            .lock()
            .unwrap()
            .history
            .entry(address.to_string())
            .or_default()
            .insert(0, info);
    }

    /// Record a successful incoming transfer of `lamports` to `recipient`
    /// from `sender`, visible to history and every lookup.
    pub fn seed_transfer(
        &self,
        signature: &TxSignature,
        sender: &WalletAddress,
        recipient: &WalletAddress,
        lamports: u64,
        block_time: Option<Timestamp>,
    ) {
        let block_time = block_time.map(|t| t.as_secs() as i64);
        let details = TransactionDetails {
            slot: 900,
            block_time,
            fee: Some(TRANSFER_FEE),
            err: None,
            account_keys: vec![
                sender.to_string(),
                recipient.to_string(),
                "11111111111111111111111111111111".into(),
            ],
            pre_balances: vec![lamports + TRANSFER_FEE + 1_000_000, 0, 1],
            post_balances: vec![1_000_000, lamports, 1],
            log_messages: Vec::new(),
        };
        self.insert_transaction(signature, details);
        let info = SignatureInfo {
            signature: signature.to_string(),
            block_time,
            err: None,
        };
        self.push_history(recipient, info.clone());
        self.push_history(sender, info);
    }

    pub fn submitted(&self) -> Vec<TxSignature> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn calls(&self) -> Vec<RpcCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, call: RpcCall) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| **c == call)
            .count()
    }

    fn enter(&self, call: RpcCall) -> Result<(), LedgerError> {
        self.state.lock().unwrap().calls.push(call);
        if self.offline.load(Ordering::SeqCst) {
            return Err(LedgerError::Unreachable(format!(
                "{} is offline",
                self.name
            )));
        }
        Ok(())
    }

    fn block_time(&self) -> Option<i64> {
        self.clock.as_ref().map(|c| c.now().as_secs() as i64)
    }

    /// Decode a transfer produced by `faucet_ledger::build_transfer` and apply it.
    fn apply_transfer(&self, wire: &[u8]) -> Result<TxSignature, LedgerError> {
        let malformed = || LedgerError::SubmissionRejected("malformed transaction".into());
        // compact-u16(1) ‖ sig[64] ‖ header[3] ‖ compact-u16(3) ‖ keys[3][32] ‖ ...
        if wire.len() < 1 + 64 + 150 || wire[0] != 1 {
            return Err(malformed());
        }
        let sig = &wire[1..65];
        let msg = &wire[65..];
        let funder = base58::encode(&msg[4..36]);
        let recipient = base58::encode(&msg[36..68]);
        let lamports = u64::from_le_bytes(msg[142..150].try_into().map_err(|_| malformed())?);
        let signature = TxSignature::parse(base58::encode(sig)).map_err(|_| malformed())?;

        let visibility = *self.visibility.lock().unwrap();
        let block_time = self.block_time();
        let mut state = self.state.lock().unwrap();

        let funder_before = state.balances.get(&funder).copied().unwrap_or(0);
        let recipient_before = state.balances.get(&recipient).copied().unwrap_or(0);
        let needed = lamports + TRANSFER_FEE;
        if funder_before < needed {
            return Err(LedgerError::SubmissionRejected(
                "insufficient funds for fee".into(),
            ));
        }

        let failed = visibility == Visibility::Failed;
        let (funder_after, recipient_after) = if failed {
            (funder_before - TRANSFER_FEE, recipient_before)
        } else {
            (funder_before - needed, recipient_before + lamports)
        };
        state.balances.insert(funder.clone(), funder_after);
        state.balances.insert(recipient.clone(), recipient_after);
        state.slot += 1;
        let slot = state.slot;

        let err = failed.then(|| json!({ "InstructionError": [0, { "Custom": 1 }] }));
        let details = TransactionDetails {
            slot,
            block_time,
            fee: Some(TRANSFER_FEE),
            err: err.clone(),
            account_keys: vec![
                funder.clone(),
                recipient.clone(),
                "11111111111111111111111111111111".into(),
            ],
            pre_balances: vec![funder_before, recipient_before, 1],
            post_balances: vec![funder_after, recipient_after, 1],
            log_messages: Vec::new(),
        };
        let status = SignatureStatus {
            slot,
            confirmations: Some(1),
            err: err.clone(),
            confirmation_status: Some("confirmed".into()),
        };

        match visibility {
            Visibility::Full | Visibility::Failed => {
                state.transactions.insert(signature.to_string(), details);
                state.statuses.insert(signature.to_string(), status);
            }
            Visibility::StatusOnly => {
                state.statuses.insert(signature.to_string(), status);
            }
            Visibility::Hidden => {}
        }
        if visibility != Visibility::Hidden {
            let info = SignatureInfo {
                signature: signature.to_string(),
                block_time,
                err,
            };
            for key in [&recipient, &funder] {
                state.history.entry(key.clone()).or_default().insert(0, info.clone());
            }
        }
        state.submitted.push(signature.clone());
        Ok(signature)
    }
}

#[async_trait]
impl LedgerRpc for NullLedger {
    fn endpoint(&self) -> &str {
        &self.name
    }

    async fn get_balance(&self, address: &WalletAddress) -> Result<Lamports, LedgerError> {
        self.enter(RpcCall::GetBalance)?;
        Ok(Lamports::new(self.balance_of(address)))
    }

    async fn get_latest_blockhash(&self) -> Result<Blockhash, LedgerError> {
        self.enter(RpcCall::GetLatestBlockhash)?;
        let slot = self.state.lock().unwrap().slot;
        let mut bytes = [7u8; 32];
        bytes[..8].copy_from_slice(&slot.to_le_bytes());
        Ok(Blockhash::new(base58::encode(&bytes)))
    }

    async fn send_transaction(&self, wire: &[u8]) -> Result<TxSignature, LedgerError> {
        self.enter(RpcCall::SendTransaction)?;
        if self.reject_submissions.load(Ordering::SeqCst) {
            return Err(LedgerError::SubmissionRejected("blockhash not found".into()));
        }
        self.apply_transfer(wire)
    }

    async fn get_transaction(
        &self,
        signature: &TxSignature,
    ) -> Result<Option<TransactionDetails>, LedgerError> {
        self.enter(RpcCall::GetTransaction)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .transactions
            .get(signature.as_str())
            .cloned())
    }

    async fn get_transaction_raw(
        &self,
        signature: &TxSignature,
    ) -> Result<Option<TransactionDetails>, LedgerError> {
        self.enter(RpcCall::GetTransactionRaw)?;
        let state = self.state.lock().unwrap();
        Ok(state
            .transactions
            .get(signature.as_str())
            .or_else(|| state.raw_only.get(signature.as_str()))
            .cloned())
    }

    async fn get_signature_status(
        &self,
        signature: &TxSignature,
    ) -> Result<Option<SignatureStatus>, LedgerError> {
        self.enter(RpcCall::GetSignatureStatus)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .statuses
            .get(signature.as_str())
            .cloned())
    }

    async fn get_signatures_for_address(
        &self,
        address: &WalletAddress,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, LedgerError> {
        self.enter(RpcCall::GetSignaturesForAddress)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .history
            .get(address.as_str())
            .map(|h| h.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
