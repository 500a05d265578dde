//! # Evidence Registry
//!
//! Fixed ring of time-sharded `ReceiptId -> Timestamp` stores. Slot 0 is the
//! current shard; rotation evicts the last slot, shifts the others down and
//! installs a fresh shard in slot 0.
//!
//! ## Retention
//!
//! A record written into slot 0 is evicted on the second rotation after it was
//! written. Rotations are at least `interval` apart, so a record stays
//! discoverable for at least one full interval, provided something calls a
//! write path (or [`EvidenceStore::rotate`]) at least once per interval. There
//! is no background scheduler.
//!
//! [`EvidenceRegistry::record_execution`] only accepts executions in
//! `[deadline - interval / 2, deadline]`, so every accepted record is still
//! present when the dispute window closes at `deadline + interval / 2`.
//!
//! ## Concurrency
//!
//! Writes and rotations serialize on the ring's write lock: a record written
//! concurrently with a rotation lands either in the old slot 0 (and is moved to
//! slot 1) or in the fresh slot 0, never in an evicted shard.

use crate::algorithms::evidence;
use crate::domain::{
    invariant_execution_window, invariant_registry_match, AccountabilityError, Address, Receipt,
    ReceiptId, RotationOutcome, Shard, Timestamp, SHARD_COUNT,
};
use crate::events::AccountabilityEvent;
use crate::ports::inbound::EvidenceStore;
use crate::ports::outbound::{EventPublisher, TimeSource};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

struct ShardRing {
    interval: Timestamp,
    shards: [Shard; SHARD_COUNT],
}

impl ShardRing {
    fn rotate(&mut self, now: Timestamp) -> RotationOutcome {
        if !self.shards[0].is_due(now, self.interval) {
            return RotationOutcome::NotDue;
        }
        // Last slot moves to the front and is immediately replaced.
        self.shards.rotate_right(1);
        self.shards[0] = Shard::new(now);
        RotationOutcome::Rotated
    }
}

/// Time-sharded evidence log.
///
/// Constructed with [`EvidenceRegistry::new`] and made usable by a single call
/// to [`EvidenceRegistry::initialize`].
pub struct EvidenceRegistry {
    address: Address,
    clock: Arc<dyn TimeSource>,
    publisher: Arc<dyn EventPublisher>,
    ring: RwLock<Option<ShardRing>>,
}

impl EvidenceRegistry {
    /// Create an uninitialized registry.
    pub fn new(
        address: Address,
        clock: Arc<dyn TimeSource>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            address,
            clock,
            publisher,
            ring: RwLock::new(None),
        }
    }

    /// Allocate every shard with `created_at = now`. Runs at most once.
    pub fn initialize(&self, interval: Timestamp) -> Result<(), AccountabilityError> {
        let now = self.clock.now();
        let mut ring = self.ring.write();
        if ring.is_some() {
            return Err(AccountabilityError::RegistryAlreadyInitialized);
        }
        *ring = Some(ShardRing {
            interval,
            shards: std::array::from_fn(|_| Shard::new(now)),
        });

        info!(
            "[qc-18] Registry 0x{} initialized: {} shards, interval {}",
            hex::encode(self.address),
            SHARD_COUNT,
            interval
        );
        Ok(())
    }

    /// Whether [`EvidenceRegistry::initialize`] has run.
    pub fn is_initialized(&self) -> bool {
        self.ring.read().is_some()
    }

    /// Creation time of the shard in `index`.
    pub fn shard_created_at(&self, index: usize) -> Option<Timestamp> {
        self.ring
            .read()
            .as_ref()
            .and_then(|ring| ring.shards.get(index))
            .map(Shard::created_at)
    }

    /// Number of records in the shard in `index`.
    pub fn shard_len(&self, index: usize) -> Option<usize> {
        self.ring
            .read()
            .as_ref()
            .and_then(|ring| ring.shards.get(index))
            .map(Shard::len)
    }

    /// First shard holding any record of `id`, regardless of deadline.
    pub fn locate(&self, id: &ReceiptId) -> Option<(usize, Timestamp)> {
        self.ring
            .read()
            .as_ref()
            .and_then(|ring| evidence::locate(&ring.shards, id))
    }

    /// Record that `receipt` was executed now. Entry point for the job executor.
    ///
    /// Fails with [`AccountabilityError::ExecutionOutsideWindow`] unless
    /// `deadline - interval / 2 <= now <= deadline`.
    pub fn record_execution(&self, receipt: &Receipt) -> Result<bool, AccountabilityError> {
        invariant_registry_match(receipt, &self.address)?;
        let interval = self
            .interval()
            .ok_or(AccountabilityError::RegistryNotInitialized)?;
        let now = self.clock.now();
        if let Err(e) = invariant_execution_window(receipt.deadline, interval, now) {
            warn!("[qc-18] Rejected execution of 0x{}: {}", receipt.id().short(), e);
            return Err(e);
        }
        self.record_if_absent(receipt.id(), now)
    }

    fn emit(&self, event: AccountabilityEvent) {
        if let Err(e) = self.publisher.publish(event) {
            warn!("[qc-18] Failed to publish registry event: {}", e);
        }
    }

    fn announce_rotation(&self, outcome: RotationOutcome, now: Timestamp) {
        if outcome == RotationOutcome::Rotated {
            info!(
                "[qc-18] Registry 0x{} rotated shards at {}",
                hex::encode(self.address),
                now
            );
            self.emit(AccountabilityEvent::ShardRotated {
                registry: self.address,
                rotated_at: now,
            });
        }
    }
}

impl EvidenceStore for EvidenceRegistry {
    fn address(&self) -> Address {
        self.address
    }

    fn interval(&self) -> Option<Timestamp> {
        self.ring.read().as_ref().map(|ring| ring.interval)
    }

    fn shard_count(&self) -> usize {
        SHARD_COUNT
    }

    fn record_if_absent(
        &self,
        id: ReceiptId,
        timestamp: Timestamp,
    ) -> Result<bool, AccountabilityError> {
        if timestamp == 0 {
            return Err(AccountabilityError::ZeroTimestamp);
        }

        let now = self.clock.now();
        let (outcome, written) = {
            let mut guard = self.ring.write();
            let ring = guard
                .as_mut()
                .ok_or(AccountabilityError::RegistryNotInitialized)?;
            let outcome = ring.rotate(now);
            let written = ring.shards[0].insert_if_absent(id, timestamp);
            (outcome, written)
        };

        self.announce_rotation(outcome, now);
        if written {
            debug!("[qc-18] Recorded {} at {}", id.short(), timestamp);
        } else {
            debug!("[qc-18] {} already recorded, keeping first write", id.short());
        }
        Ok(written)
    }

    fn fetch(&self, shard_index: usize, id: &ReceiptId) -> Option<Timestamp> {
        self.ring
            .read()
            .as_ref()
            .and_then(|ring| ring.shards.get(shard_index))
            .and_then(|shard| shard.get(id))
    }

    fn rotate(&self) -> RotationOutcome {
        let now = self.clock.now();
        let outcome = match self.ring.write().as_mut() {
            Some(ring) => ring.rotate(now),
            None => RotationOutcome::Uninitialized,
        };
        self.announce_rotation(outcome, now);
        outcome
    }

    fn qualifying_evidence(
        &self,
        id: &ReceiptId,
        deadline: Timestamp,
    ) -> Option<(usize, Timestamp)> {
        self.ring
            .read()
            .as_ref()
            .and_then(|ring| evidence::find_qualifying_evidence(&ring.shards, id, deadline))
    }
}
