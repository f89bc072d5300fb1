//! Fundamental types for the faucet.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! wallet addresses, social post ids, transaction references, amounts, timestamps and
//! the claim record appended to a wallet's history.

pub mod address;
pub mod amount;
pub mod claim;
pub mod error;
pub mod hash;
pub mod post;
pub mod time;

pub use address::WalletAddress;
pub use amount::Lamports;
pub use claim::ClaimRecord;
pub use error::FaucetError;
pub use hash::{Blockhash, TxSignature};
pub use post::PostId;
pub use time::{Clock, SystemClock, Timestamp, HOUR_MS};

/// Base58 alphabet used by the ledger for addresses, signatures and blockhashes.
pub const BASE58_ALPHABET: &[u8; 58] =
    b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Whether every byte of `s` belongs to the base58 alphabet.
pub fn is_base58(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| BASE58_ALPHABET.contains(&b))
}
