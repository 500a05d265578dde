//! # Recoverable ECDSA Signatures (secp256k1)
//!
//! Receipt signatures are verified by recovering the signer address from the
//! signature and comparing it with a configured, publicly known address.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S normalization (EIP-2), high-S signatures are rejected on recovery
//! - Addresses are the last 20 bytes of `keccak256(uncompressed_pubkey[1..])`

use crate::hashing::{keccak256, signed_message_hash, Hash};
use crate::CryptoError;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use zeroize::Zeroizing;

/// 20-byte account address derived from a public key.
pub type Address = [u8; 20];

/// ECDSA signature with recovery id (65 bytes, r||s||v).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    /// R component
    pub r: [u8; 32],
    /// S component
    pub s: [u8; 32],
    /// Recovery id (0, 1, 27 or 28)
    pub v: u8,
}

impl RecoverableSignature {
    /// Create from 65 bytes in r||s||v order.
    pub fn from_bytes(bytes: [u8; 65]) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Self { r, s, v: bytes[64] }
    }

    /// Serialize to 65 bytes in r||s||v order.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    fn recovery_id(&self) -> Result<RecoveryId, CryptoError> {
        let id = match self.v {
            0 | 27 => 0,
            1 | 28 => 1,
            other => return Err(CryptoError::InvalidRecoveryId(other)),
        };
        RecoveryId::try_from(id).map_err(|_| CryptoError::InvalidRecoveryId(self.v))
    }
}

/// secp256k1 keypair used to sign receipt identifiers.
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Address of this keypair.
    pub fn address(&self) -> Address {
        address_from_key(self.signing_key.verifying_key())
    }

    /// Sign a 32-byte digest as-is (no prefix).
    pub fn sign_prehash(&self, prehash: &Hash) -> Result<RecoverableSignature, CryptoError> {
        let (sig, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(prehash)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

        let bytes = sig.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        Ok(RecoverableSignature {
            r,
            s,
            v: 27 + recovery_id.to_byte(),
        })
    }

    /// Sign a 32-byte message under the signed-message prefix.
    pub fn sign_message(&self, digest: &Hash) -> Result<RecoverableSignature, CryptoError> {
        self.sign_prehash(&signed_message_hash(digest))
    }

    /// Secret key bytes, wiped when the returned buffer is dropped.
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes().into())
    }
}

/// Recover the address that produced `signature` over a prefixed 32-byte message.
pub fn recover_signer(
    digest: &Hash,
    signature: &RecoverableSignature,
) -> Result<Address, CryptoError> {
    recover_prehash(&signed_message_hash(digest), signature)
}

/// Recover the address that produced `signature` over a raw prehash.
pub fn recover_prehash(
    prehash: &Hash,
    signature: &RecoverableSignature,
) -> Result<Address, CryptoError> {
    let recovery_id = signature.recovery_id()?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);
    let sig = Signature::from_slice(&sig_bytes).map_err(|_| CryptoError::InvalidSignatureFormat)?;

    // EIP-2: only the low-S form is accepted
    if sig.normalize_s().is_some() {
        return Err(CryptoError::MalleableSignature);
    }

    let key = VerifyingKey::recover_from_prehash(prehash, &sig, recovery_id)
        .map_err(|_| CryptoError::RecoveryFailed)?;
    Ok(address_from_key(&key))
}

fn address_from_key(key: &VerifyingKey) -> Address {
    let encoded = key.to_encoded_point(false);
    // Skip the 0x04 uncompressed marker
    let hash = keccak256(&encoded.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}
