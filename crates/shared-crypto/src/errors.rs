//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Invalid private key
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Invalid signature format (r or s out of range)
    #[error("Invalid signature format")]
    InvalidSignatureFormat,

    /// Recovery id is not 0, 1, 27 or 28
    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// S is in the upper half of the curve order (EIP-2)
    #[error("Malleable signature: high S value")]
    MalleableSignature,

    /// Public key recovery failed
    #[error("Public key recovery failed")]
    RecoveryFailed,

    /// Signing failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_id_error_names_value() {
        let err = CryptoError::InvalidRecoveryId(42);
        assert!(err.to_string().contains("42"));
    }
}
