//! # Domain Value Objects
//!
//! Identity, lifecycle status and the monotonic lock latch.

use super::errors::Hash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Canonical identifier of a receipt (Keccak-256 of its encoded fields).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReceiptId(pub Hash);

impl ReceiptId {
    /// Raw bytes.
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }

    /// Short form for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Compensation claim lifecycle.
///
/// ```text
/// None -> Pending -> Compensated -> Resolved
///            └── (latch tripped, stays Pending)
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompensationStatus {
    /// No claim has been raised.
    #[default]
    None,
    /// Claim accepted, awaiting payment from the relayer.
    Pending,
    /// Relayer paid, awaiting withdrawal by the beneficiary.
    Compensated,
    /// Beneficiary withdrew the compensation.
    Resolved,
}

impl CompensationStatus {
    /// Check if transition is valid. Status only moves forward one step.
    pub fn can_transition_to(&self, next: CompensationStatus) -> bool {
        matches!(
            (self, next),
            (Self::None, Self::Pending)
                | (Self::Pending, Self::Compensated)
                | (Self::Compensated, Self::Resolved)
        )
    }
}

/// One-way flag recording that unresolved fraud was observed.
///
/// The only mutator is [`LockLatch::trip`]; there is no way back to unlocked.
#[derive(Debug, Default)]
pub struct LockLatch(AtomicBool);

impl LockLatch {
    /// Create an unlocked latch.
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Set the latch. Returns `true` only for the call that flipped it.
    pub fn trip(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    /// Whether the latch has been tripped.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of a rotation attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationOutcome {
    /// The oldest shard was evicted and a fresh shard installed.
    Rotated,
    /// The current shard is younger than the interval; nothing changed.
    NotDue,
    /// The registry has no shards yet.
    Uninitialized,
}
