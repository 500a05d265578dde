//! # Keccak-256 Hashing
//!
//! The hash behind receipt identifiers and signer addresses.

use sha3::{Digest, Keccak256};

/// Keccak-256 output (256-bit).
pub type Hash = [u8; 32];

/// Prefix applied to a 32-byte digest before it is signed.
pub const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Hash data with Keccak-256 (one-shot).
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash multiple inputs as one concatenated stream.
pub fn keccak256_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}

/// Digest that is actually signed for a 32-byte message.
///
/// `keccak256(SIGNED_MESSAGE_PREFIX || digest)`
pub fn signed_message_hash(digest: &Hash) -> Hash {
    keccak256_many(&[SIGNED_MESSAGE_PREFIX, digest])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak_empty_vector() {
        let hash = keccak256(b"");
        assert_eq!(
            hex::encode(hash),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(keccak256(b"receipt"), keccak256(b"receipt"));
        assert_ne!(keccak256(b"receipt-1"), keccak256(b"receipt-2"));
    }

    #[test]
    fn test_many_matches_concatenation() {
        let joined = keccak256(b"hello world");
        let streamed = keccak256_many(&[b"hello ", b"world"]);
        assert_eq!(joined, streamed);
    }

    #[test]
    fn test_signed_message_hash_differs_from_plain() {
        let digest = keccak256(b"job");
        assert_ne!(signed_message_hash(&digest), keccak256(&digest));
    }
}
