//! # Receipt Codec
//!
//! Canonical encoding and identifier of a receipt, plus signature handling.
//!
//! ## Wire Format
//!
//! Each field is written as an 8-byte big-endian length followed by its bytes,
//! in this fixed order:
//!
//! | # | Field | Bytes |
//! |---|-------|-------|
//! | 1 | target | 20 |
//! | 2 | sender | 20 |
//! | 3 | payload | variable |
//! | 4 | deadline | 8 (u64 BE) |
//! | 5 | compensation_amount | 16 (u128 BE) |
//! | 6 | gas_limit | 8 (u64 BE) |
//! | 7 | chain_id | 8 (u64 BE) |
//! | 8 | registry_address | 20 |
//!
//! The identifier is `keccak256(encoding)`. Changing the order or the framing
//! invalidates every receipt already issued.

use crate::domain::{AccountabilityError, Address, Receipt, ReceiptId};
use shared_crypto::{keccak256, recover_signer, CryptoError, RecoverableSignature, Secp256k1KeyPair};

fn put_field(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
    buf.extend_from_slice(bytes);
}

/// Canonical byte encoding of a receipt.
pub fn encode_receipt(receipt: &Receipt) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 * 8 + 20 * 3 + 8 * 3 + 16 + receipt.payload.len());
    put_field(&mut buf, &receipt.target);
    put_field(&mut buf, &receipt.sender);
    put_field(&mut buf, &receipt.payload);
    put_field(&mut buf, &receipt.deadline.to_be_bytes());
    put_field(&mut buf, &receipt.compensation_amount.to_be_bytes());
    put_field(&mut buf, &receipt.gas_limit.to_be_bytes());
    put_field(&mut buf, &receipt.chain_id.to_be_bytes());
    put_field(&mut buf, &receipt.registry_address);
    buf
}

/// Canonical identifier of a receipt.
pub fn receipt_id(receipt: &Receipt) -> ReceiptId {
    ReceiptId(keccak256(&encode_receipt(receipt)))
}

/// Sign a receipt identifier as the receipt signer.
pub fn sign_receipt(
    signer: &Secp256k1KeyPair,
    receipt: &Receipt,
) -> Result<RecoverableSignature, CryptoError> {
    signer.sign_message(receipt_id(receipt).as_bytes())
}

/// Check that `signature` over `id` recovers to `expected`.
pub fn verify_receipt_signature(
    id: &ReceiptId,
    signature: &RecoverableSignature,
    expected: &Address,
) -> Result<(), AccountabilityError> {
    let recovered = recover_signer(id.as_bytes(), signature)
        .map_err(|e| AccountabilityError::InvalidSignature(e.to_string()))?;

    if recovered != *expected {
        return Err(AccountabilityError::SignerMismatch {
            expected: *expected,
            recovered,
        });
    }
    Ok(())
}
