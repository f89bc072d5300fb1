//! Claim history records.

use serde::{Deserialize, Serialize};

use crate::{Lamports, Timestamp, TxSignature, WalletAddress};

/// One completed faucet transfer as shown in a wallet's history.
///
/// Records built from the ledger and records appended locally after a claim
/// share this shape; the transaction signature is the identity used to merge them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRecord {
    pub id: String,
    pub wallet_address: WalletAddress,
    pub timestamp: Timestamp,
    pub amount: Lamports,
    pub tx_signature: TxSignature,
}

impl ClaimRecord {
    /// Build a record whose id is derived from the signature.
    pub fn new(
        wallet_address: WalletAddress,
        timestamp: Timestamp,
        amount: Lamports,
        tx_signature: TxSignature,
    ) -> Self {
        Self {
            id: tx_signature.as_str().to_string(),
            wallet_address,
            timestamp,
            amount,
            tx_signature,
        }
    }
}
