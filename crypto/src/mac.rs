//! HMAC-SHA256 helpers.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 of `message` under `key`.
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    // HMAC accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(key)
        .unwrap_or_else(|_| unreachable!("hmac accepts any key length"));
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// Lowercase hex HMAC-SHA256 of `message` under `key`.
pub fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> String {
    hex::encode(hmac_sha256(key, message))
}

/// Constant-time check of a hex-encoded tag.
///
/// Only the canonical form (64 lowercase hex digits) is accepted, so no two
/// distinct tag strings verify for the same message.
pub fn verify_hmac_sha256(key: &[u8], message: &[u8], tag_hex: &str) -> bool {
    let canonical = tag_hex.len() == 64
        && tag_hex
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if !canonical {
        return false;
    }
    let Ok(tag) = hex::decode(tag_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(message);
    mac.verify_slice(&tag).is_ok()
}

/// Constant-time equality of two secrets of any length.
///
/// Both sides are reduced to an HMAC under a fixed key before comparison, so
/// timing reveals neither the contents nor the length of `expected`.
pub fn secrets_equal(expected: &[u8], provided: &[u8]) -> bool {
    const COMPARE_KEY: &[u8] = b"faucet secret comparison";
    let tag = hmac_sha256(COMPARE_KEY, expected);
    let Ok(mut mac) = HmacSha256::new_from_slice(COMPARE_KEY) else {
        return false;
    };
    mac.update(provided);
    mac.verify_slice(&tag).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc4231_case_2() {
        let tag = hmac_sha256_hex(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            tag,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn verify_accepts_own_tag() {
        let tag = hmac_sha256_hex(b"secret", b"payload");
        assert!(verify_hmac_sha256(b"secret", b"payload", &tag));
    }

    #[test]
    fn verify_rejects_other_key_and_bad_hex() {
        let tag = hmac_sha256_hex(b"secret", b"payload");
        assert!(!verify_hmac_sha256(b"other", b"payload", &tag));
        assert!(!verify_hmac_sha256(b"secret", b"payload", "zz"));
        assert!(!verify_hmac_sha256(b"secret", b"payload", &tag[..10]));
    }

    #[test]
    fn uppercase_tag_rejected() {
        let tag = hmac_sha256_hex(b"secret", b"payload");
        assert!(!verify_hmac_sha256(b"secret", b"payload", &tag.to_uppercase()));
    }

    #[test]
    fn secret_comparison() {
        assert!(secrets_equal(b"admin-token", b"admin-token"));
        assert!(!secrets_equal(b"admin-token", b"admin-tokem"));
        assert!(!secrets_equal(b"admin-token", b"admin"));
        assert!(!secrets_equal(b"admin-token", b""));
    }
}
