//! The faucet's funding keypair.
//!
//! The secret is supplied as base58 of 64 bytes: the 32-byte Ed25519 seed
//! followed by the 32-byte public key. The public half must match the seed.

use ed25519_dalek::{SigningKey, KEYPAIR_LENGTH};
use faucet_types::WalletAddress;
use zeroize::Zeroizing;

use crate::{base58, CryptoError};

/// Ed25519 keypair that signs outgoing transfers.
pub struct FundingKeypair {
    signing: SigningKey,
}

impl FundingKeypair {
    /// Load the keypair from its base58 secret.
    pub fn from_base58_secret(secret: &str) -> Result<Self, CryptoError> {
        let decoded = Zeroizing::new(
            base58::decode(secret.trim())
                .ok_or_else(|| CryptoError::InvalidSecretKey("not valid base58".into()))?,
        );
        if decoded.len() != KEYPAIR_LENGTH {
            return Err(CryptoError::InvalidSecretKey(format!(
                "expected {KEYPAIR_LENGTH} bytes, got {}",
                decoded.len()
            )));
        }
        let mut bytes = Zeroizing::new([0u8; KEYPAIR_LENGTH]);
        bytes.copy_from_slice(&decoded);
        let signing = SigningKey::from_keypair_bytes(&bytes).map_err(|_| {
            CryptoError::InvalidSecretKey("public key does not match seed".into())
        })?;
        Ok(Self { signing })
    }

    /// Derive a keypair from a 32-byte seed (deterministic).
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing: SigningKey::from_bytes(seed),
        }
    }

    /// Generate a fresh keypair from OS randomness.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut seed = Zeroizing::new([0u8; 32]);
        getrandom::getrandom(seed.as_mut())
            .map_err(|e| CryptoError::Randomness(e.to_string()))?;
        Ok(Self::from_seed(&seed))
    }

    /// Encode the keypair in the same base58 form `from_base58_secret` accepts.
    pub fn to_base58_secret(&self) -> Zeroizing<String> {
        Zeroizing::new(base58::encode(&self.signing.to_keypair_bytes()))
    }

    pub fn public_bytes(&self) -> [u8; 32] {
        self.signing.verifying_key().to_bytes()
    }

    pub fn address(&self) -> WalletAddress {
        crate::address_from_public(&self.public_bytes())
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing
    }
}

impl std::fmt::Debug for FundingKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FundingKeypair")
            .field("address", &self.address().as_str())
            .finish_non_exhaustive()
    }
}
