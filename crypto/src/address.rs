//! Conversions between wallet addresses and Ed25519 public keys.

use faucet_types::WalletAddress;

use crate::base58;

/// Extract the 32 public key bytes behind an address.
///
/// Returns `None` if the address does not decode to exactly 32 bytes. This is
/// stricter than [`WalletAddress::parse`], which only checks the text shape.
pub fn decode_address(address: &str) -> Option<[u8; 32]> {
    base58::decode_fixed(address.trim())
}

/// Render a public key as a wallet address.
pub fn address_from_public(public_key: &[u8; 32]) -> WalletAddress {
    // A 32-byte key always encodes to 32..=44 base58 characters.
    WalletAddress::parse(base58::encode(public_key))
        .unwrap_or_else(|_| unreachable!("32-byte key encodes to a valid address"))
}
