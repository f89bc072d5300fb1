//! JSON-RPC 2.0 client for a ledger HTTP endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use faucet_types::{Blockhash, Lamports, TxSignature, WalletAddress};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::rpc::{LedgerRpc, SignatureInfo, SignatureStatus, TransactionDetails};
use crate::LedgerError;

/// Default timeout for ledger requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for a wallet's signature history listing.
pub const HISTORY_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for a single transaction fetch.
pub const TRANSACTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Commitment level used for every query.
const COMMITMENT: &str = "confirmed";

/// Client for one ledger JSON-RPC endpoint.
pub struct JsonRpcClient {
    endpoint: String,
    http_client: reqwest::Client,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct BlockhashValue {
    blockhash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureEntry {
    signature: String,
    #[serde(default)]
    block_time: Option<i64>,
    #[serde(default)]
    err: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusEntry {
    slot: u64,
    #[serde(default)]
    confirmations: Option<u64>,
    #[serde(default)]
    err: Option<Value>,
    #[serde(default)]
    confirmation_status: Option<String>,
}

/// Account keys come back as plain strings (`json` encoding) or as objects
/// carrying a `pubkey` field (`jsonParsed` encoding).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AccountKey {
    Plain(String),
    Parsed { pubkey: String },
}

impl AccountKey {
    fn into_string(self) -> String {
        match self {
            AccountKey::Plain(s) => s,
            AccountKey::Parsed { pubkey } => pubkey,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    account_keys: Vec<AccountKey>,
}

#[derive(Debug, Deserialize)]
struct RawTransactionBody {
    message: RawMessage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMeta {
    #[serde(default)]
    err: Option<Value>,
    #[serde(default)]
    fee: Option<u64>,
    #[serde(default)]
    pre_balances: Vec<u64>,
    #[serde(default)]
    post_balances: Vec<u64>,
    #[serde(default)]
    log_messages: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransaction {
    slot: u64,
    #[serde(default)]
    block_time: Option<i64>,
    #[serde(default)]
    meta: Option<RawMeta>,
    transaction: RawTransactionBody,
}

impl From<RawTransaction> for TransactionDetails {
    fn from(raw: RawTransaction) -> Self {
        let meta = raw.meta.unwrap_or_default();
        TransactionDetails {
            slot: raw.slot,
            block_time: raw.block_time,
            fee: meta.fee,
            err: meta.err.filter(|e| !e.is_null()),
            account_keys: raw
                .transaction
                .message
                .account_keys
                .into_iter()
                .map(AccountKey::into_string)
                .collect(),
            pre_balances: meta.pre_balances,
            post_balances: meta.post_balances,
            log_messages: meta.log_messages.unwrap_or_default(),
        }
    }
}

fn map_send_error(e: reqwest::Error) -> LedgerError {
    if e.is_timeout() {
        LedgerError::Unreachable(format!("request timed out: {e}"))
    } else if e.is_connect() {
        LedgerError::Unreachable(format!("connection failed: {e}"))
    } else {
        LedgerError::RequestFailed(e.to_string())
    }
}

impl JsonRpcClient {
    /// Create a client for `endpoint` with default timeout settings.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom default timeout.
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            endpoint: endpoint.into(),
            http_client,
            next_id: AtomicU64::new(1),
        }
    }

    /// Issue one JSON-RPC call. `Ok(None)` when the call succeeded with a null result.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
        timeout: Option<Duration>,
    ) -> Result<Option<T>, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(endpoint = %self.endpoint, method, id, "ledger rpc call");

        let mut request = self.http_client.post(&self.endpoint).json(&body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(LedgerError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let envelope: RpcEnvelope<T> = response.json().await.map_err(|e| {
            LedgerError::InvalidResponse(format!("failed to parse {method} response: {e}"))
        })?;

        if let Some(err) = envelope.error {
            return Err(LedgerError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(envelope.result)
    }

    async fn fetch_transaction(
        &self,
        signature: &TxSignature,
        encoding: &str,
    ) -> Result<Option<TransactionDetails>, LedgerError> {
        let raw: Option<RawTransaction> = self
            .call(
                "getTransaction",
                json!([signature.as_str(), {
                    "encoding": encoding,
                    "commitment": COMMITMENT,
                    "maxSupportedTransactionVersion": 0,
                }]),
                Some(TRANSACTION_TIMEOUT),
            )
            .await?;
        Ok(raw.map(TransactionDetails::from))
    }
}

fn missing(method: &str) -> LedgerError {
    LedgerError::InvalidResponse(format!("{method} returned no result"))
}

#[async_trait]
impl LedgerRpc for JsonRpcClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_balance(&self, address: &WalletAddress) -> Result<Lamports, LedgerError> {
        let balance: WithContext<u64> = self
            .call(
                "getBalance",
                json!([address.as_str(), { "commitment": COMMITMENT }]),
                None,
            )
            .await?
            .ok_or_else(|| missing("getBalance"))?;
        Ok(Lamports::new(balance.value))
    }

    async fn get_latest_blockhash(&self) -> Result<Blockhash, LedgerError> {
        let latest: WithContext<BlockhashValue> = self
            .call(
                "getLatestBlockhash",
                json!([{ "commitment": COMMITMENT }]),
                None,
            )
            .await?
            .ok_or_else(|| missing("getLatestBlockhash"))?;
        Ok(Blockhash::new(latest.value.blockhash))
    }

    async fn send_transaction(&self, wire: &[u8]) -> Result<TxSignature, LedgerError> {
        let encoded = BASE64.encode(wire);
        let result: Option<String> = self
            .call(
                "sendTransaction",
                json!([encoded, {
                    "encoding": "base64",
                    "preflightCommitment": COMMITMENT,
                }]),
                None,
            )
            .await
            .map_err(|e| match e {
                LedgerError::Rpc { code, message } => {
                    LedgerError::SubmissionRejected(format!("{code}: {message}"))
                }
                other => other,
            })?;
        let signature = result.ok_or_else(|| missing("sendTransaction"))?;
        TxSignature::parse(signature).map_err(|e| LedgerError::InvalidResponse(e.to_string()))
    }

    async fn get_transaction(
        &self,
        signature: &TxSignature,
    ) -> Result<Option<TransactionDetails>, LedgerError> {
        self.fetch_transaction(signature, "json").await
    }

    async fn get_transaction_raw(
        &self,
        signature: &TxSignature,
    ) -> Result<Option<TransactionDetails>, LedgerError> {
        self.fetch_transaction(signature, "jsonParsed").await
    }

    async fn get_signature_status(
        &self,
        signature: &TxSignature,
    ) -> Result<Option<SignatureStatus>, LedgerError> {
        let statuses: WithContext<Vec<Option<StatusEntry>>> = self
            .call(
                "getSignatureStatuses",
                json!([[signature.as_str()], { "searchTransactionHistory": true }]),
                None,
            )
            .await?
            .ok_or_else(|| missing("getSignatureStatuses"))?;
        Ok(statuses
            .value
            .into_iter()
            .next()
            .flatten()
            .map(|s| SignatureStatus {
                slot: s.slot,
                confirmations: s.confirmations,
                err: s.err.filter(|e| !e.is_null()),
                confirmation_status: s.confirmation_status,
            }))
    }

    async fn get_signatures_for_address(
        &self,
        address: &WalletAddress,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, LedgerError> {
        let entries: Vec<SignatureEntry> = self
            .call(
                "getSignaturesForAddress",
                json!([address.as_str(), { "limit": limit, "commitment": COMMITMENT }]),
                Some(HISTORY_TIMEOUT),
            )
            .await?
            .unwrap_or_default();
        Ok(entries
            .into_iter()
            .map(|e| SignatureInfo {
                signature: e.signature,
                block_time: e.block_time,
                err: e.err.filter(|v| !v.is_null()),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = JsonRpcClient::new("https://rpc.example.org");
        assert_eq!(client.endpoint(), "https://rpc.example.org");
    }

    #[test]
    fn parses_json_encoded_transaction() {
        let raw = r#"{
            "slot": 1234,
            "blockTime": 1714564800,
            "meta": {
                "err": null,
                "fee": 5000,
                "preBalances": [1000000000, 0, 1],
                "postBalances": [499995000, 500000000, 1],
                "logMessages": ["Program 11111111111111111111111111111111 invoke [1]"]
            },
            "transaction": {
                "message": {
                    "accountKeys": ["AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", "BBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB", "11111111111111111111111111111111"]
                },
                "signatures": ["x"]
            }
        }"#;
        let tx: TransactionDetails = serde_json::from_str::<RawTransaction>(raw).unwrap().into();
        assert_eq!(tx.slot, 1234);
        assert_eq!(tx.fee, Some(5000));
        assert!(tx.err.is_none());
        assert_eq!(tx.account_keys.len(), 3);
        let wallet = WalletAddress::parse("B".repeat(32)).unwrap();
        assert_eq!(tx.credited_to(&wallet), Some(500_000_000));
    }

    #[test]
    fn parses_json_parsed_account_keys() {
        let raw = r#"{
            "slot": 7,
            "blockTime": null,
            "meta": { "err": {"InstructionError": [0, "Custom"]}, "fee": 5000, "preBalances": [], "postBalances": [] },
            "transaction": {
                "message": {
                    "accountKeys": [
                        {"pubkey": "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", "signer": true, "writable": true},
                        {"pubkey": "BBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB", "signer": false, "writable": true}
                    ]
                }
            }
        }"#;
        let tx: TransactionDetails = serde_json::from_str::<RawTransaction>(raw).unwrap().into();
        assert_eq!(tx.account_keys[1], "B".repeat(32));
        assert!(tx.err.is_some());
        assert!(tx.block_time.is_none());
    }

    #[test]
    fn envelope_with_error() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"Invalid param"}}"#;
        let env: RpcEnvelope<u64> = serde_json::from_str(raw).unwrap();
        assert!(env.result.is_none());
        assert_eq!(env.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        // Port 9 (discard) on localhost is almost never listening.
        let client = JsonRpcClient::with_timeout("http://127.0.0.1:9", Duration::from_millis(500));
        let err = client.get_latest_blockhash().await.unwrap_err();
        assert!(err.is_transport(), "unexpected error: {err}");
    }
}
