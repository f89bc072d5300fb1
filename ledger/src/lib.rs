//! Ledger access for the faucet.
//!
//! The ledger is reached only through the [`LedgerRpc`] capability. On top of
//! it this crate builds the signed transfer, submits it ([`TransferDispatcher`]),
//! confirms it ([`ConfirmationVerifier`]) and reconstructs past faucet
//! transfers from a wallet's signature history ([`TransferScanner`]).

pub mod client;
pub mod confirmation;
pub mod dispatcher;
pub mod error;
pub mod history;
pub mod retry;
pub mod rpc;
pub mod transaction;

pub use client::JsonRpcClient;
pub use confirmation::{
    ConfirmationOutcome, ConfirmationVerifier, VerificationDetails, VerificationMethod,
    VerificationReport,
};
pub use dispatcher::{FundingCredential, TransferDispatcher};
pub use error::LedgerError;
pub use history::{TransferScanner, HISTORY_SCAN_LIMIT};
pub use retry::retry;
pub use rpc::{LedgerRpc, SignatureInfo, SignatureStatus, TransactionDetails};
pub use transaction::{build_transfer, SignedTransfer};
