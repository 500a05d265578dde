//! # Shared Crypto - Receipt Hashing and Signing Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | Keccak-256 | Receipt identifiers, signed-message digests |
//! | `ecdsa` | secp256k1 (recoverable) | Receipt signer keys, signer recovery |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic nonces, low-S only (EIP-2)
//! - **Signed messages**: every digest carries the `"\x19Ethereum Signed Message:\n32"`
//!   domain-separation prefix before signing, so a receipt signature can never
//!   double as a transaction signature

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{recover_signer, Address, RecoverableSignature, Secp256k1KeyPair};
pub use errors::CryptoError;
pub use hashing::{keccak256, keccak256_many, signed_message_hash, Hash};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
