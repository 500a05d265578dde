//! # Event Schema
//!
//! Notifications emitted after a state change commits. They carry enough
//! identifiers and amounts for off-system auditing.
//!
//! | Event | Emitted by |
//! |-------|------------|
//! | `ShardRotated` | EvidenceRegistry |
//! | `CompensationRequested`, `CompensationIssued`, `CompensationWithdrawn`, `Locked` | Adjudicator |
//! | `DependencyAdded`, `EscrowDeposit`, `EscrowLatched`, `WithdrawalRequested`, `WithdrawalCompleted` | EscrowGuard |

use crate::domain::{Address, Amount, ReceiptId, Timestamp};
use serde::{Deserialize, Serialize};

/// Topics for relay accountability events.
pub mod topics {
    /// Registry shard rotation.
    pub const REGISTRY: &str = "relay.registry";
    /// Compensation claim lifecycle.
    pub const COMPENSATION: &str = "relay.compensation";
    /// Adjudicator lock latch.
    pub const LOCK: &str = "relay.lock";
    /// Escrow deposits, dependencies and withdrawals.
    pub const ESCROW: &str = "relay.escrow";
}

/// Notification emitted by a relay accountability component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountabilityEvent {
    /// Oldest shard evicted, fresh shard installed.
    ShardRotated {
        /// Registry address
        registry: Address,
        /// Creation time of the new current shard
        rotated_at: Timestamp,
    },
    /// A compensation claim was accepted.
    CompensationRequested {
        /// Adjudicator address
        adjudicator: Address,
        /// Disputed receipt
        receipt_id: ReceiptId,
        /// Who will receive compensation
        beneficiary: Address,
        /// Promised amount
        amount: Amount,
        /// Deadline for the relayer to pay
        pay_by_deadline: Timestamp,
    },
    /// The relayer paid a pending claim.
    CompensationIssued {
        /// Adjudicator address
        adjudicator: Address,
        /// Disputed receipt
        receipt_id: ReceiptId,
        /// Paid amount
        amount: Amount,
    },
    /// The beneficiary withdrew a paid claim.
    CompensationWithdrawn {
        /// Adjudicator address
        adjudicator: Address,
        /// Disputed receipt
        receipt_id: ReceiptId,
        /// Recipient
        beneficiary: Address,
        /// Transferred amount
        amount: Amount,
    },
    /// An unpaid claim tripped the adjudicator's latch.
    Locked {
        /// Adjudicator address
        adjudicator: Address,
        /// Receipt that was never paid
        receipt_id: ReceiptId,
    },
    /// Escrow now follows another lock source.
    DependencyAdded {
        /// Escrow address
        escrow: Address,
        /// Dependency address
        dependency: Address,
    },
    /// Funds credited to an escrow.
    EscrowDeposit {
        /// Escrow address
        escrow: Address,
        /// Depositor
        from: Address,
        /// Credited amount
        amount: Amount,
    },
    /// Escrow's own latch tripped after observing a locked dependency.
    EscrowLatched {
        /// Escrow address
        escrow: Address,
    },
    /// Administrator started the withdrawal timer.
    WithdrawalRequested {
        /// Escrow address
        escrow: Address,
        /// Earliest completion time (exclusive)
        ready_at: Timestamp,
    },
    /// Escrow balance paid out to the administrator.
    WithdrawalCompleted {
        /// Escrow address
        escrow: Address,
        /// Recipient
        recipient: Address,
        /// Transferred amount
        amount: Amount,
    },
}

impl AccountabilityEvent {
    /// Topic this event is published on.
    pub fn topic(&self) -> &'static str {
        match self {
            Self::ShardRotated { .. } => topics::REGISTRY,
            Self::CompensationRequested { .. }
            | Self::CompensationIssued { .. }
            | Self::CompensationWithdrawn { .. } => topics::COMPENSATION,
            Self::Locked { .. } => topics::LOCK,
            Self::DependencyAdded { .. }
            | Self::EscrowDeposit { .. }
            | Self::EscrowLatched { .. }
            | Self::WithdrawalRequested { .. }
            | Self::WithdrawalCompleted { .. } => topics::ESCROW,
        }
    }
}
