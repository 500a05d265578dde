//! # QC-18 Relay Accountability
//!
//! Fraud-proof protocol that holds a relayer financially accountable for jobs
//! it promised to execute.
//!
//! **Subsystem ID:** 18  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! A user holds a receipt signed by the relayer's receipt signer. If the job is
//! not executed by the receipt deadline, the user can claim compensation. The
//! relayer's only defense is a record of timely execution in the evidence
//! registry. An unpaid claim trips a one-way latch that freezes every escrow
//! depending on the adjudicator.
//!
//! ## Security Properties
//!
//! | Defense | Description |
//! |---------|-------------|
//! | Bounded dispute window | Claims close `interval / 2` after the deadline |
//! | Retention | Evidence survives at least one full interval |
//! | Recoverable ECDSA | Receipts are checked against the configured signer |
//! | Monotonic latch | Locks never reset |
//! | Commit before transfer | Reentrant withdrawals see the advanced status |
//!
//! ## Module Structure
//!
//! ```text
//! qc-18-relay-accountability/
//! ├── domain/          # Receipt, Shard, CompensationStatus, LockLatch, errors
//! ├── algorithms/      # Receipt codec, evidence lookup
//! ├── ports/           # EvidenceStore, LockSource, TimeSource, ValueTransfer
//! ├── adapters/        # In-memory ledger, event publishers
//! └── service/         # EvidenceRegistry, Adjudicator, EscrowGuard
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod config;
pub mod domain;
pub mod events;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{InMemoryLedger, Payout, RecordingPublisher, TracingPublisher};
pub use algorithms::{
    encode_receipt, find_qualifying_evidence, locate, receipt_id, sign_receipt,
    verify_receipt_signature,
};
pub use config::{AccountabilityConfig, ConfigError};
pub use domain::{
    dispute_window_end, AccountabilityError, Address, Amount, CompensationRecord,
    CompensationStatus, ErrorKind, Hash, LockLatch, Receipt, ReceiptBuilder, ReceiptId,
    RotationOutcome, Shard, Timestamp, SHARD_COUNT,
};
pub use events::{topics, AccountabilityEvent};
pub use ports::{
    EventPublisher, EvidenceStore, LockSource, ManualTimeSource, PublishError, TimeSource,
    TransferError, ValueTransfer,
};
pub use service::{Adjudicator, EscrowGuard, EvidenceRegistry};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
