//! Transfer transaction construction.
//!
//! Wire layout of a legacy single-signer transfer:
//!
//! ```text
//! compact-u16(1) ‖ signature[64] ‖ message
//! message = header[3] ‖ compact-u16(3) ‖ keys[3][32] ‖ blockhash[32]
//!         ‖ compact-u16(1) ‖ instruction
//! instruction = program_idx ‖ compact-u16(2) ‖ [0, 1] ‖ compact-u16(12) ‖ data
//! data = u32 LE 2 (transfer) ‖ u64 LE lamports
//! ```

use faucet_crypto::{base58, sign_message, FundingKeypair};
use faucet_types::{Lamports, TxSignature};

use crate::LedgerError;

/// The system program id (all-zero key).
pub const SYSTEM_PROGRAM_ID: [u8; 32] = [0u8; 32];

/// System program instruction index for a lamport transfer.
const SYSTEM_TRANSFER: u32 = 2;

/// A signed transfer ready for submission.
#[derive(Clone, Debug)]
pub struct SignedTransfer {
    /// Serialized transaction bytes.
    pub wire: Vec<u8>,
    /// Reference the ledger will know the transaction by.
    pub signature: TxSignature,
}

/// Append a compact-u16 (7 bits per byte, little-endian, high bit = continue).
pub fn encode_compact_u16(mut value: u16, out: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Serialize the transfer message that gets signed.
pub fn transfer_message(
    funder: &[u8; 32],
    recipient: &[u8; 32],
    lamports: Lamports,
    blockhash: &[u8; 32],
) -> Vec<u8> {
    let mut msg = Vec::with_capacity(3 + 1 + 96 + 32 + 1 + 1 + 1 + 2 + 1 + 12);

    // 1 required signature, 0 read-only signed, 1 read-only unsigned (the program).
    msg.extend_from_slice(&[1, 0, 1]);

    encode_compact_u16(3, &mut msg);
    msg.extend_from_slice(funder);
    msg.extend_from_slice(recipient);
    msg.extend_from_slice(&SYSTEM_PROGRAM_ID);

    msg.extend_from_slice(blockhash);

    encode_compact_u16(1, &mut msg);
    msg.push(2);
    encode_compact_u16(2, &mut msg);
    msg.extend_from_slice(&[0, 1]);
    encode_compact_u16(12, &mut msg);
    msg.extend_from_slice(&SYSTEM_TRANSFER.to_le_bytes());
    msg.extend_from_slice(&lamports.raw().to_le_bytes());

    msg
}

/// Build and sign a transfer of `lamports` from the funding account to `recipient`.
pub fn build_transfer(
    funder: &FundingKeypair,
    recipient: &[u8; 32],
    lamports: Lamports,
    blockhash: &str,
) -> Result<SignedTransfer, LedgerError> {
    let funder_key = funder.public_bytes();
    if *recipient == funder_key {
        return Err(LedgerError::InvalidRecipient(
            "recipient is the funding account".into(),
        ));
    }
    let blockhash: [u8; 32] = base58::decode_fixed(blockhash)
        .ok_or_else(|| LedgerError::InvalidResponse(format!("malformed blockhash {blockhash}")))?;

    let message = transfer_message(&funder_key, recipient, lamports, &blockhash);
    let sig = sign_message(&message, funder);

    let mut wire = Vec::with_capacity(1 + 64 + message.len());
    encode_compact_u16(1, &mut wire);
    wire.extend_from_slice(&sig);
    wire.extend_from_slice(&message);

    let signature = TxSignature::parse(base58::encode(&sig))
        .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;

    Ok(SignedTransfer { wire, signature })
}

#[cfg(test)]
mod tests {
    use super::*;
    use faucet_crypto::verify_signature;

    fn compact(v: u16) -> Vec<u8> {
        let mut out = Vec::new();
        encode_compact_u16(v, &mut out);
        out
    }

    #[test]
    fn compact_u16_encoding() {
        assert_eq!(compact(0), vec![0x00]);
        assert_eq!(compact(0x7f), vec![0x7f]);
        assert_eq!(compact(0x80), vec![0x80, 0x01]);
        assert_eq!(compact(0x3fff), vec![0xff, 0x7f]);
        assert_eq!(compact(0x4000), vec![0x80, 0x80, 0x01]);
        assert_eq!(compact(u16::MAX), vec![0xff, 0xff, 0x03]);
    }

    #[test]
    fn message_layout() {
        let msg = transfer_message(&[1u8; 32], &[2u8; 32], Lamports::new(500_000_000), &[3u8; 32]);
        assert_eq!(msg.len(), 3 + 1 + 96 + 32 + 1 + 1 + 1 + 2 + 1 + 12);
        assert_eq!(&msg[..4], &[1, 0, 1, 3]);
        assert_eq!(&msg[4..36], &[1u8; 32]);
        assert_eq!(&msg[36..68], &[2u8; 32]);
        assert_eq!(&msg[68..100], &[0u8; 32]);
        assert_eq!(&msg[100..132], &[3u8; 32]);
        // one instruction, program index 2, accounts [0, 1], 12 data bytes
        assert_eq!(&msg[132..138], &[1, 2, 2, 0, 1, 12]);
        assert_eq!(&msg[138..142], &2u32.to_le_bytes());
        assert_eq!(&msg[142..150], &500_000_000u64.to_le_bytes());
    }

    #[test]
    fn signed_transfer_verifies() {
        let funder = FundingKeypair::from_seed(&[5u8; 32]);
        let blockhash = base58::encode(&[9u8; 32]);
        let tx = build_transfer(&funder, &[7u8; 32], Lamports::new(42), &blockhash).unwrap();

        assert_eq!(tx.wire[0], 1);
        let sig: [u8; 64] = tx.wire[1..65].try_into().unwrap();
        let message = &tx.wire[65..];
        assert!(verify_signature(message, &sig, &funder.public_bytes()));
        assert_eq!(tx.signature.as_str(), base58::encode(&sig));
    }

    #[test]
    fn self_transfer_rejected() {
        let funder = FundingKeypair::from_seed(&[5u8; 32]);
        let blockhash = base58::encode(&[9u8; 32]);
        let err =
            build_transfer(&funder, &funder.public_bytes(), Lamports::new(1), &blockhash).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRecipient(_)));
    }

    #[test]
    fn malformed_blockhash_rejected() {
        let funder = FundingKeypair::from_seed(&[5u8; 32]);
        let err = build_transfer(&funder, &[7u8; 32], Lamports::new(1), "not!base58").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidResponse(_)));
    }
}
