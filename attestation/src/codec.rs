//! Token Codec: stateless signing and verification of attestation tokens.
//!
//! Wire format: `base64url(JSON(payload)) "." hex(HMAC-SHA256(secret, base64url part))`.
//! Nothing is stored server-side; revocation is the replay guard's job.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use faucet_crypto::{hmac_sha256_hex, verify_hmac_sha256};
use faucet_types::{PostId, Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

/// Separator between the encoded payload and its signature.
const SEPARATOR: char = '.';

/// How far in the future an issuance time may lie (clock skew allowance).
pub const MAX_FUTURE_SKEW_MS: u64 = 60_000;

/// What a token attests: this wallet published this post at `issued_at`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationPayload {
    pub wallet_address: WalletAddress,
    pub post_id: PostId,
    /// Issuance time, epoch milliseconds.
    #[serde(rename = "iat")]
    pub issued_at: Timestamp,
}

/// Why a token was rejected. Every failure mode is a value; `verify` never panics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token has no signature separator")]
    MissingSeparator,

    #[error("token signature does not match")]
    BadSignature,

    #[error("token payload is malformed: {0}")]
    Malformed(String),

    #[error("token has expired")]
    Expired,

    #[error("token issued in the future")]
    IssuedInFuture,
}

/// Issues and verifies attestation tokens under one server secret.
pub struct AttestationCodec {
    secret: Zeroizing<Vec<u8>>,
    max_age_ms: Option<u64>,
}

impl AttestationCodec {
    /// A codec whose tokens never expire.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: Zeroizing::new(secret.as_ref().to_vec()),
            max_age_ms: None,
        }
    }

    /// Reject tokens older than `max_age`.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age_ms = Some(max_age.as_millis() as u64);
        self
    }

    pub fn max_age_ms(&self) -> Option<u64> {
        self.max_age_ms
    }

    /// Issue a token binding `wallet` to `post` at time `now`.
    pub fn issue(&self, wallet: &WalletAddress, post: &PostId, now: Timestamp) -> String {
        let payload = AttestationPayload {
            wallet_address: wallet.clone(),
            post_id: post.clone(),
            issued_at: now,
        };
        self.encode(&payload)
    }

    /// Encode and sign an arbitrary payload.
    pub fn encode(&self, payload: &AttestationPayload) -> String {
        // Serializing a struct of strings and integers cannot fail.
        let json = serde_json::to_vec(payload).unwrap_or_default();
        let body = URL_SAFE_NO_PAD.encode(json);
        let sig = hmac_sha256_hex(&self.secret, body.as_bytes());
        format!("{body}{SEPARATOR}{sig}")
    }

    /// Verify a token and return its payload.
    ///
    /// The signature is checked before the payload is decoded, so nothing
    /// about an unsigned payload is ever trusted.
    pub fn verify(&self, token: &str, now: Timestamp) -> Result<AttestationPayload, TokenError> {
        let (body, sig) = token
            .trim()
            .split_once(SEPARATOR)
            .ok_or(TokenError::MissingSeparator)?;
        if body.is_empty() || sig.is_empty() {
            return Err(TokenError::MissingSeparator);
        }
        if !verify_hmac_sha256(&self.secret, body.as_bytes(), sig) {
            return Err(TokenError::BadSignature);
        }

        let json = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;
        let payload: AttestationPayload =
            serde_json::from_slice(&json).map_err(|e| TokenError::Malformed(e.to_string()))?;

        if payload.issued_at.as_millis() > now.as_millis().saturating_add(MAX_FUTURE_SKEW_MS) {
            return Err(TokenError::IssuedInFuture);
        }
        if let Some(max_age) = self.max_age_ms {
            if payload.issued_at.has_expired(max_age, now) {
                return Err(TokenError::Expired);
            }
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: Timestamp = Timestamp::from_millis(1_714_564_800_000);

    fn wallet() -> WalletAddress {
        WalletAddress::parse("4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T").unwrap()
    }

    fn post() -> PostId {
        PostId::parse("1785000000000000000").unwrap()
    }

    #[test]
    fn issue_then_verify() {
        let codec = AttestationCodec::new("secret");
        let token = codec.issue(&wallet(), &post(), NOW);
        let payload = codec.verify(&token, NOW).unwrap();
        assert_eq!(payload.wallet_address, wallet());
        assert_eq!(payload.post_id, post());
        assert_eq!(payload.issued_at, NOW);
    }

    #[test]
    fn wire_format() {
        let codec = AttestationCodec::new("secret");
        let token = codec.issue(&wallet(), &post(), NOW);
        let (body, sig) = token.split_once('.').unwrap();
        assert_eq!(sig.len(), 64);
        let json: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(body).unwrap()).unwrap();
        assert_eq!(json["walletAddress"], wallet().as_str());
        assert_eq!(json["postId"], "1785000000000000000");
        assert_eq!(json["iat"], NOW.as_millis());
    }

    #[test]
    fn other_secret_rejected() {
        let token = AttestationCodec::new("secret").issue(&wallet(), &post(), NOW);
        let err = AttestationCodec::new("other").verify(&token, NOW).unwrap_err();
        assert_eq!(err, TokenError::BadSignature);
    }

    #[test]
    fn missing_separator_rejected() {
        let codec = AttestationCodec::new("secret");
        assert_eq!(codec.verify("nodot", NOW), Err(TokenError::MissingSeparator));
        assert_eq!(codec.verify(".abc", NOW), Err(TokenError::MissingSeparator));
        assert_eq!(codec.verify("", NOW), Err(TokenError::MissingSeparator));
    }

    #[test]
    fn signed_garbage_is_malformed() {
        let codec = AttestationCodec::new("secret");
        let body = URL_SAFE_NO_PAD.encode(b"{\"not\":\"a payload\"}");
        let token = format!("{body}.{}", hmac_sha256_hex(b"secret", body.as_bytes()));
        assert!(matches!(codec.verify(&token, NOW), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn tampered_payload_rejected() {
        let codec = AttestationCodec::new("secret");
        let token = codec.issue(&wallet(), &post(), NOW);
        let (_, sig) = token.split_once('.').unwrap();
        let forged = codec.issue(&wallet(), &PostId::parse("1").unwrap(), NOW);
        let (forged_body, _) = forged.split_once('.').unwrap();
        let spliced = format!("{forged_body}.{sig}");
        assert_eq!(codec.verify(&spliced, NOW), Err(TokenError::BadSignature));
    }

    #[test]
    fn max_age_enforced() {
        let codec = AttestationCodec::new("secret").with_max_age(Duration::from_secs(3600));
        let token = codec.issue(&wallet(), &post(), NOW);
        assert!(codec.verify(&token, NOW.plus_millis(3_599_999)).is_ok());
        assert_eq!(
            codec.verify(&token, NOW.plus_millis(3_600_000)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn future_tokens_rejected_beyond_skew() {
        let codec = AttestationCodec::new("secret");
        let token = codec.issue(&wallet(), &post(), NOW.plus_millis(MAX_FUTURE_SKEW_MS + 1));
        assert_eq!(codec.verify(&token, NOW), Err(TokenError::IssuedInFuture));
        let token = codec.issue(&wallet(), &post(), NOW.plus_millis(MAX_FUTURE_SKEW_MS));
        assert!(codec.verify(&token, NOW).is_ok());
    }
}
