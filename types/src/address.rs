//! Wallet address type.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::FaucetError;

/// A ledger wallet address: the base58 encoding of a 32-byte public key.
///
/// Construction only checks the textual shape (alphabet and length). Decoding
/// the address to its 32 key bytes is done by `faucet_crypto::decode_address`,
/// which is the check the transfer path relies on.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Shortest base58 rendering of a 32-byte key.
    pub const MIN_LEN: usize = 32;
    /// Longest base58 rendering of a 32-byte key.
    pub const MAX_LEN: usize = 44;

    /// Parse an address, rejecting anything that cannot be a base58 32-byte key.
    pub fn parse(raw: impl Into<String>) -> Result<Self, FaucetError> {
        let s = raw.into();
        let trimmed = s.trim();
        if trimmed.len() < Self::MIN_LEN || trimmed.len() > Self::MAX_LEN {
            return Err(FaucetError::InvalidAddress(format!(
                "expected {}-{} base58 characters, got {}",
                Self::MIN_LEN,
                Self::MAX_LEN,
                trimmed.len()
            )));
        }
        if !crate::is_base58(trimmed) {
            return Err(FaucetError::InvalidAddress(
                "address contains non-base58 characters".into(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = FaucetError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<WalletAddress> for String {
    fn from(addr: WalletAddress) -> Self {
        addr.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSTEM_PROGRAM: &str = "11111111111111111111111111111111";

    #[test]
    fn parse_accepts_base58_key() {
        let addr = WalletAddress::parse("4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T").unwrap();
        assert_eq!(addr.as_str().len(), 44);
        assert!(WalletAddress::parse(SYSTEM_PROGRAM).is_ok());
    }

    #[test]
    fn parse_trims_whitespace() {
        let addr = WalletAddress::parse(format!("  {SYSTEM_PROGRAM}\n")).unwrap();
        assert_eq!(addr.as_str(), SYSTEM_PROGRAM);
    }

    #[test]
    fn short_address_rejected() {
        let err = WalletAddress::parse("abc").unwrap_err();
        assert!(matches!(err, FaucetError::InvalidAddress(_)));
    }

    #[test]
    fn ambiguous_characters_rejected() {
        // '0', 'O', 'I' and 'l' are not part of the base58 alphabet.
        let bad = format!("0{}", &SYSTEM_PROGRAM[1..]);
        assert!(WalletAddress::parse(bad).is_err());
        let bad = format!("l{}", &SYSTEM_PROGRAM[1..]);
        assert!(WalletAddress::parse(bad).is_err());
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<WalletAddress, _> = serde_json::from_str(&format!("\"{SYSTEM_PROGRAM}\""));
        assert!(ok.is_ok());
        let bad: Result<WalletAddress, _> = serde_json::from_str("\"abc\"");
        assert!(bad.is_err());
    }
}
