//! Base58 encoding with the ledger's alphabet.
//!
//! Leading zero bytes map to leading `1` characters; the remainder is a plain
//! big-number base conversion. Inputs here are at most 64 bytes, so the
//! quadratic conversion is fine.

use faucet_types::BASE58_ALPHABET;

/// Reverse lookup table: ASCII byte → base58 digit (0xFF = invalid).
const BASE58_DECODE: [u8; 128] = {
    let mut table = [0xFFu8; 128];
    let alpha = BASE58_ALPHABET;
    let mut i = 0;
    while i < 58 {
        table[alpha[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Encode a byte slice as base58.
pub fn encode(bytes: &[u8]) -> String {
    let zeros = bytes.iter().take_while(|&&b| b == 0).count();

    // Little-endian base58 digits of the non-zero tail.
    let mut digits: Vec<u8> = Vec::with_capacity(bytes.len() * 138 / 100 + 1);
    for &byte in &bytes[zeros..] {
        let mut carry = byte as u32;
        for d in digits.iter_mut() {
            carry += (*d as u32) << 8;
            *d = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }

    let mut result = String::with_capacity(zeros + digits.len());
    for _ in 0..zeros {
        result.push('1');
    }
    for &d in digits.iter().rev() {
        result.push(BASE58_ALPHABET[d as usize] as char);
    }
    result
}

/// Decode a base58 string. Returns `None` on characters outside the alphabet.
pub fn decode(s: &str) -> Option<Vec<u8>> {
    let ones = s.bytes().take_while(|&c| c == b'1').count();

    // Little-endian base256 accumulator.
    let mut bytes: Vec<u8> = Vec::with_capacity(s.len());
    for c in s.bytes().skip(ones) {
        if c >= 128 {
            return None;
        }
        let val = BASE58_DECODE[c as usize];
        if val == 0xFF {
            return None;
        }
        let mut carry = val as u32;
        for b in bytes.iter_mut() {
            carry += (*b as u32) * 58;
            *b = (carry & 0xFF) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xFF) as u8);
            carry >>= 8;
        }
    }

    let mut result = vec![0u8; ones];
    result.extend(bytes.iter().rev());
    Some(result)
}

/// Decode a base58 string into a fixed-size byte array. `None` on invalid
/// characters or if the decoded length is not exactly `N`.
pub fn decode_fixed<const N: usize>(s: &str) -> Option<[u8; N]> {
    decode(s)?.try_into().ok()
}
