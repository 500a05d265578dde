//! # Inbound Ports
//!
//! Capabilities other components call on a relay accountability instance.

use crate::domain::{AccountabilityError, Address, ReceiptId, RotationOutcome, Timestamp};

/// Evidence log written by job execution and read by adjudicators.
pub trait EvidenceStore: Send + Sync {
    /// Address receipts use to name this store.
    fn address(&self) -> Address;

    /// Rotation interval, `None` before initialization.
    fn interval(&self) -> Option<Timestamp>;

    /// Number of shard slots.
    fn shard_count(&self) -> usize;

    /// Record execution time of `id` in the current shard unless already present.
    /// Returns `true` if the record was written.
    fn record_if_absent(
        &self,
        id: ReceiptId,
        timestamp: Timestamp,
    ) -> Result<bool, AccountabilityError>;

    /// Stored execution time of `id` in `shard_index`; `None` when absent or out of range.
    fn fetch(&self, shard_index: usize, id: &ReceiptId) -> Option<Timestamp>;

    /// Evict the oldest shard if the current one is at least one interval old.
    fn rotate(&self) -> RotationOutcome;

    /// First on-time record of `id` across all shards.
    fn qualifying_evidence(&self, id: &ReceiptId, deadline: Timestamp)
        -> Option<(usize, Timestamp)>;

    /// Whether any shard proves `id` was executed at or before `deadline`.
    fn check_evidence(&self, id: &ReceiptId, deadline: Timestamp) -> bool {
        self.qualifying_evidence(id, deadline).is_some()
    }
}

/// Anything that reports a boolean lock state.
///
/// Implementations must be monotonic: once `is_locked` returns `true` it keeps
/// returning `true`.
pub trait LockSource: Send + Sync {
    /// Identity of the source, used for duplicate detection.
    fn address(&self) -> Address;

    /// Current lock state.
    fn is_locked(&self) -> bool;

    /// Whether this source follows `address`, directly or through its own
    /// dependencies. Sources without dependencies follow nothing.
    fn depends_on(&self, _address: &Address) -> bool {
        false
    }
}
