//! Ledger reference types: transaction signatures and blockhashes.
//!
//! Both travel as base58 text on the wire and are only ever compared or
//! forwarded, so they are kept in their textual form.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::FaucetError;

/// The base58 signature that identifies a submitted transfer on the ledger.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxSignature(String);

impl TxSignature {
    /// Base58 length range of a 64-byte ed25519 signature.
    pub const MIN_LEN: usize = 64;
    pub const MAX_LEN: usize = 88;

    pub fn parse(raw: impl Into<String>) -> Result<Self, FaucetError> {
        let s = raw.into();
        let s = s.trim();
        if s.len() < Self::MIN_LEN || s.len() > Self::MAX_LEN || !crate::is_base58(s) {
            return Err(FaucetError::InvalidSignature(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TxSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.0.get(..8).unwrap_or(&self.0);
        write!(f, "TxSignature({short}..)")
    }
}

impl fmt::Display for TxSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for TxSignature {
    type Error = FaucetError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<TxSignature> for String {
    fn from(sig: TxSignature) -> Self {
        sig.0
    }
}

/// A recent blockhash, required to build a transfer the ledger will accept.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blockhash(String);

impl Blockhash {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_length_checked() {
        let ok = "5".repeat(87);
        assert!(TxSignature::parse(ok).is_ok());
        assert!(TxSignature::parse("5".repeat(10)).is_err());
        assert!(TxSignature::parse("0".repeat(87)).is_err());
    }

    #[test]
    fn signature_debug_is_abbreviated() {
        let sig = TxSignature::parse("3".repeat(70)).unwrap();
        assert_eq!(format!("{sig:?}"), "TxSignature(33333333..)");
    }
}
