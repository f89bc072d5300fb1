//! Ed25519 message signing and verification.

use ed25519_dalek::{Signature, Signer, Verifier, VerifyingKey};

use crate::FundingKeypair;

/// Sign a message with the funding key, returning the 64-byte signature.
pub fn sign_message(message: &[u8], keypair: &FundingKeypair) -> [u8; 64] {
    keypair.signing_key().sign(message).to_bytes()
}

/// Verify a signature against a message and public key.
pub fn verify_signature(message: &[u8], signature: &[u8; 64], public_key: &[u8; 32]) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(public_key) else {
        return false;
    };
    let sig = Signature::from_bytes(signature);
    verifying_key.verify(message, &sig).is_ok()
}
