//! Cryptographic primitives for the faucet.
//!
//! - **Ed25519** for signing ledger transfers with the funding key
//! - **HMAC-SHA256** for attestation tokens
//! - **Base58** for addresses, signatures and the funding secret
//! - OS randomness for opaque token ids

pub mod address;
pub mod base58;
pub mod error;
pub mod keys;
pub mod mac;
pub mod random;
pub mod sign;

pub use address::{address_from_public, decode_address};
pub use error::CryptoError;
pub use keys::FundingKeypair;
pub use mac::{hmac_sha256, hmac_sha256_hex, secrets_equal, verify_hmac_sha256};
pub use random::random_hex;
pub use sign::{sign_message, verify_signature};
