//! # Adjudicator
//!
//! Compensation state machine for disputed receipts:
//!
//! ```text
//! NONE -> PENDING -> COMPENSATED -> RESOLVED
//!            |
//!            +-- pay-by deadline passes unpaid -> lock (status stays PENDING)
//! ```
//!
//! Records are never deleted; the latch never resets.

use crate::algorithms::verify_receipt_signature;
use crate::config::{AccountabilityConfig, ConfigError};
use crate::domain::{
    invariant_deadline_passed, invariant_dispute_window_open, invariant_exact_payment,
    invariant_registry_match, AccountabilityError, Address, Amount, CompensationRecord,
    CompensationStatus, LockLatch, Receipt, ReceiptId, Timestamp,
};
use crate::events::AccountabilityEvent;
use crate::ports::inbound::{EvidenceStore, LockSource};
use crate::ports::outbound::{EventPublisher, TimeSource, ValueTransfer};
use parking_lot::Mutex;
use shared_crypto::RecoverableSignature;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Default)]
struct Ledger {
    claims: HashMap<ReceiptId, CompensationRecord>,
    held_balance: Amount,
}

impl Ledger {
    fn status(&self, id: &ReceiptId) -> CompensationStatus {
        self.claims.get(id).map(|r| r.status).unwrap_or_default()
    }

    /// Advance `id` from `from` to `to`, or report the status it is actually in.
    fn advance(
        &mut self,
        id: ReceiptId,
        from: CompensationStatus,
        to: CompensationStatus,
    ) -> Result<(), AccountabilityError> {
        debug_assert!(from.can_transition_to(to));
        match self.claims.get_mut(&id) {
            Some(record) if record.status == from => {
                record.status = to;
                Ok(())
            }
            other => Err(AccountabilityError::InvalidStatus {
                id,
                expected: from,
                actual: other.map(|r| r.status).unwrap_or_default(),
            }),
        }
    }
}

/// Adjudicates compensation claims against one evidence registry.
pub struct Adjudicator {
    address: Address,
    config: AccountabilityConfig,
    registry: Arc<dyn EvidenceStore>,
    clock: Arc<dyn TimeSource>,
    ledger: Arc<dyn ValueTransfer>,
    publisher: Arc<dyn EventPublisher>,
    state: Mutex<Ledger>,
    latch: LockLatch,
}

impl Adjudicator {
    /// Create an adjudicator bound to `registry`.
    ///
    /// The dispute window is derived from the registry's interval, so the
    /// registry must already be initialized.
    pub fn new(
        address: Address,
        config: AccountabilityConfig,
        registry: Arc<dyn EvidenceStore>,
        clock: Arc<dyn TimeSource>,
        ledger: Arc<dyn ValueTransfer>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            address,
            config,
            registry,
            clock,
            ledger,
            publisher,
            state: Mutex::new(Ledger::default()),
            latch: LockLatch::new(),
        })
    }

    /// This adjudicator's address; holds issued funds.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Registry this adjudicator reads evidence from.
    pub fn registry_address(&self) -> Address {
        self.registry.address()
    }

    /// Open a compensation claim for a receipt that was not executed in time.
    pub fn request_compensation(
        &self,
        receipt: &Receipt,
        signature: &RecoverableSignature,
    ) -> Result<ReceiptId, AccountabilityError> {
        let now = self.clock.now();
        let id = receipt.id();

        invariant_registry_match(receipt, &self.registry.address())?;
        invariant_deadline_passed(receipt.deadline, now)?;
        if receipt.compensation_amount == 0 {
            return Err(AccountabilityError::ZeroCompensation);
        }
        let interval = self
            .registry
            .interval()
            .ok_or(AccountabilityError::RegistryNotInitialized)?;
        invariant_dispute_window_open(receipt.deadline, interval, now)?;

        let pay_by_deadline = now.saturating_add(self.config.compensation_period);
        {
            let mut state = self.state.lock();
            if state.status(&id) != CompensationStatus::None {
                warn!("[qc-18] Duplicate compensation request for {}", id.short());
                return Err(AccountabilityError::ClaimExists(id));
            }
            verify_receipt_signature(&id, signature, &self.config.receipt_signer)?;
            if let Some((_, executed_at)) = self.registry.qualifying_evidence(&id, receipt.deadline)
            {
                warn!(
                    "[qc-18] Claim for {} rejected: executed at {}",
                    id.short(),
                    executed_at
                );
                return Err(AccountabilityError::EvidenceFound {
                    id,
                    executed_at,
                    deadline: receipt.deadline,
                });
            }
            state
                .claims
                .insert(id, CompensationRecord::pending(pay_by_deadline));
        }

        info!(
            "[qc-18] Compensation requested for {}: {} to 0x{}, pay by {}",
            id.short(),
            receipt.compensation_amount,
            hex::encode(receipt.beneficiary()),
            pay_by_deadline
        );
        self.emit(AccountabilityEvent::CompensationRequested {
            adjudicator: self.address,
            receipt_id: id,
            beneficiary: receipt.beneficiary(),
            amount: receipt.compensation_amount,
            pay_by_deadline,
        });
        Ok(id)
    }

    /// Whether the registry holds a timely record of `id`.
    pub fn check_evidence(&self, id: &ReceiptId, deadline: Timestamp) -> bool {
        self.registry.check_evidence(id, deadline)
    }

    /// Relayer pays a pending claim. `attached` must equal the promised amount.
    pub fn issue_compensation(
        &self,
        receipt: &Receipt,
        attached: Amount,
    ) -> Result<(), AccountabilityError> {
        let id = receipt.id();
        {
            let mut state = self.state.lock();
            let status = state.status(&id);
            if status != CompensationStatus::Pending {
                return Err(AccountabilityError::InvalidStatus {
                    id,
                    expected: CompensationStatus::Pending,
                    actual: status,
                });
            }
            invariant_exact_payment(receipt.compensation_amount, attached)?;
            state.advance(id, CompensationStatus::Pending, CompensationStatus::Compensated)?;
            state.held_balance = state.held_balance.saturating_add(attached);
        }

        if let Err(e) = self.ledger.accept(self.address, attached) {
            let mut state = self.state.lock();
            if let Some(record) = state.claims.get_mut(&id) {
                record.status = CompensationStatus::Pending;
            }
            state.held_balance = state.held_balance.saturating_sub(attached);
            warn!("[qc-18] Payment for {} reverted: {}", id.short(), e);
            return Err(AccountabilityError::TransferFailed(e.to_string()));
        }

        info!("[qc-18] Compensation issued for {}: {}", id.short(), attached);
        self.emit(AccountabilityEvent::CompensationIssued {
            adjudicator: self.address,
            receipt_id: id,
            amount: attached,
        });
        Ok(())
    }

    /// Pay a compensated claim out to its beneficiary.
    ///
    /// The claim is resolved before the transfer; a rejected transfer restores
    /// it to COMPENSATED.
    pub fn withdraw_compensation(&self, receipt: &Receipt) -> Result<(), AccountabilityError> {
        let id = receipt.id();
        let amount = receipt.compensation_amount;
        let beneficiary = receipt.beneficiary();

        {
            let mut state = self.state.lock();
            state.advance(id, CompensationStatus::Compensated, CompensationStatus::Resolved)?;
            state.held_balance = state.held_balance.saturating_sub(amount);
        }

        if let Err(e) = self.ledger.transfer(self.address, beneficiary, amount) {
            let mut state = self.state.lock();
            if let Some(record) = state.claims.get_mut(&id) {
                record.status = CompensationStatus::Compensated;
            }
            state.held_balance = state.held_balance.saturating_add(amount);
            warn!(
                "[qc-18] Withdrawal for {} reverted: {}",
                id.short(),
                e
            );
            return Err(AccountabilityError::TransferFailed(e.to_string()));
        }

        info!(
            "[qc-18] Compensation withdrawn for {}: {} to 0x{}",
            id.short(),
            amount,
            hex::encode(beneficiary)
        );
        self.emit(AccountabilityEvent::CompensationWithdrawn {
            adjudicator: self.address,
            receipt_id: id,
            beneficiary,
            amount,
        });
        Ok(())
    }

    /// Trip the latch for a claim left unpaid past its pay-by deadline.
    ///
    /// Calling again on an already tripped latch succeeds without emitting.
    pub fn lock(&self, receipt: &Receipt) -> Result<(), AccountabilityError> {
        let now = self.clock.now();
        let id = receipt.id();

        // Status check and trip happen under the claims lock.
        let (flipped, pay_by_deadline) = {
            let state = self.state.lock();
            let record = state.claims.get(&id).copied().unwrap_or_default();
            if record.status != CompensationStatus::Pending {
                return Err(AccountabilityError::InvalidStatus {
                    id,
                    expected: CompensationStatus::Pending,
                    actual: record.status,
                });
            }
            if now <= record.pay_by_deadline {
                return Err(AccountabilityError::GracePeriodActive {
                    pay_by_deadline: record.pay_by_deadline,
                    now,
                });
            }
            (self.latch.trip(), record.pay_by_deadline)
        };

        if flipped {
            warn!(
                "[qc-18] Adjudicator 0x{} locked: {} unpaid since {}",
                hex::encode(self.address),
                id.short(),
                pay_by_deadline
            );
            self.emit(AccountabilityEvent::Locked {
                adjudicator: self.address,
                receipt_id: id,
            });
        } else {
            debug!("[qc-18] Adjudicator already locked");
        }
        Ok(())
    }

    /// Whether the latch has tripped.
    pub fn is_locked(&self) -> bool {
        self.latch.is_set()
    }

    /// Current status of `id`.
    pub fn status(&self, id: &ReceiptId) -> CompensationStatus {
        self.state.lock().status(id)
    }

    /// Full claim record of `id`.
    pub fn record(&self, id: &ReceiptId) -> Option<CompensationRecord> {
        self.state.lock().claims.get(id).copied()
    }

    /// Funds issued by relayers and not yet withdrawn.
    pub fn held_balance(&self) -> Amount {
        self.state.lock().held_balance
    }

    /// Pending claims whose pay-by deadline has passed.
    pub fn overdue_claims(&self) -> Vec<ReceiptId> {
        let now = self.clock.now();
        let state = self.state.lock();
        let mut overdue: Vec<ReceiptId> = state
            .claims
            .iter()
            .filter(|(_, record)| record.is_overdue(now))
            .map(|(id, _)| *id)
            .collect();
        overdue.sort();
        overdue
    }

    fn emit(&self, event: AccountabilityEvent) {
        if let Err(e) = self.publisher.publish(event) {
            warn!("[qc-18] Failed to publish adjudicator event: {}", e);
        }
    }
}

impl LockSource for Adjudicator {
    fn address(&self) -> Address {
        self.address
    }

    fn is_locked(&self) -> bool {
        self.latch.is_set()
    }
}
