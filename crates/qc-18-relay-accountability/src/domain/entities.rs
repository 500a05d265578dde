//! # Domain Entities
//!
//! Receipts, compensation records and evidence shards.

use super::errors::{Address, Amount, Timestamp};
use super::value_objects::{CompensationStatus, ReceiptId};
use crate::algorithms::receipt_codec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A signed promise describing a job, its deadline and the compensation owed
/// if it is not executed in time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Contract the job calls.
    pub target: Address,
    /// User who submitted the job; receives compensation.
    pub sender: Address,
    /// Opaque job payload.
    pub payload: Vec<u8>,
    /// Latest time at which execution counts as on time.
    pub deadline: Timestamp,
    /// Amount owed if the job is not executed in time.
    pub compensation_amount: Amount,
    /// Gas promised to the job.
    pub gas_limit: u64,
    /// Chain the job runs on.
    pub chain_id: u64,
    /// Evidence registry that records execution of this job.
    pub registry_address: Address,
}

impl Receipt {
    /// Canonical identifier.
    pub fn id(&self) -> ReceiptId {
        receipt_codec::receipt_id(self)
    }

    /// Address that receives compensation.
    pub fn beneficiary(&self) -> Address {
        self.sender
    }
}

/// Builder for creating Receipt instances.
#[derive(Clone, Debug)]
pub struct ReceiptBuilder {
    receipt: Receipt,
}

impl ReceiptBuilder {
    /// Create a new builder with the fields that identify the job.
    pub fn new(registry_address: Address, sender: Address, deadline: Timestamp) -> Self {
        Self {
            receipt: Receipt {
                target: [0u8; 20],
                sender,
                payload: Vec::new(),
                deadline,
                compensation_amount: 0,
                gas_limit: 0,
                chain_id: 1,
                registry_address,
            },
        }
    }

    /// Set target contract.
    pub fn target(mut self, target: Address) -> Self {
        self.receipt.target = target;
        self
    }

    /// Set job payload.
    pub fn payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.receipt.payload = payload.into();
        self
    }

    /// Set compensation amount.
    pub fn compensation_amount(mut self, amount: Amount) -> Self {
        self.receipt.compensation_amount = amount;
        self
    }

    /// Set gas limit.
    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.receipt.gas_limit = gas_limit;
        self
    }

    /// Set chain id.
    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.receipt.chain_id = chain_id;
        self
    }

    /// Build the Receipt.
    pub fn build(self) -> Receipt {
        self.receipt
    }
}

/// Ledger entry for a disputed receipt. Never removed once created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationRecord {
    /// Current status.
    pub status: CompensationStatus,
    /// Time after which an unpaid claim may trip the lock.
    pub pay_by_deadline: Timestamp,
}

impl CompensationRecord {
    /// A freshly accepted claim.
    pub fn pending(pay_by_deadline: Timestamp) -> Self {
        Self {
            status: CompensationStatus::Pending,
            pay_by_deadline,
        }
    }

    /// Whether the payment grace period is over.
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        self.status == CompensationStatus::Pending && now > self.pay_by_deadline
    }
}

/// One time-boxed segment of the evidence log.
#[derive(Clone, Debug, Default)]
pub struct Shard {
    created_at: Timestamp,
    records: HashMap<ReceiptId, Timestamp>,
}

impl Shard {
    /// Create an empty shard.
    pub fn new(created_at: Timestamp) -> Self {
        Self {
            created_at,
            records: HashMap::new(),
        }
    }

    /// Creation time.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Recorded execution time, if any.
    pub fn get(&self, id: &ReceiptId) -> Option<Timestamp> {
        self.records.get(id).copied()
    }

    /// Insert unless a record already exists. Returns `true` if written.
    pub fn insert_if_absent(&mut self, id: ReceiptId, timestamp: Timestamp) -> bool {
        match self.records.entry(id) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(timestamp);
                true
            }
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the shard holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the shard is at least `interval` old.
    pub fn is_due(&self, now: Timestamp, interval: Timestamp) -> bool {
        now.saturating_sub(self.created_at) >= interval
    }
}
