//! # Domain Errors
//!
//! Every rejection is synchronous and local to the request that caused it.
//! Each concrete error maps to one abstract [`ErrorKind`].

use super::value_objects::{CompensationStatus, ReceiptId};
use thiserror::Error;

/// Hash type (32-byte Keccak-256).
pub type Hash = [u8; 32];

/// Address type (20-byte).
pub type Address = [u8; 20];

/// Block height or equivalent monotonic clock value.
pub type Timestamp = u64;

/// Value amount.
pub type Amount = u128;

/// Abstract failure kinds surfaced to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Receipt or dependency does not reference this instance.
    AddressMismatch,
    /// Called before a deadline, after a window closed, or before a period elapsed.
    TimingViolation,
    /// Operation attempted from the wrong lifecycle status.
    StateViolation,
    /// Signature or caller is not the configured party.
    AuthenticationFailure,
    /// Attached funds do not equal the promised amount.
    PaymentMismatch,
    /// Claim or dependency already exists.
    DuplicateEntry,
}

/// Relay accountability errors.
#[derive(Debug, Error)]
pub enum AccountabilityError {
    /// Receipt names another registry.
    #[error(
        "Receipt targets registry 0x{}, this registry is 0x{}",
        hex::encode(.actual),
        hex::encode(.expected)
    )]
    RegistryMismatch {
        /// Registry this component is bound to
        expected: Address,
        /// Registry named by the receipt
        actual: Address,
    },

    /// A component was asked to depend on itself.
    #[error("Escrow 0x{} cannot depend on itself", hex::encode(.0))]
    SelfDependency(Address),

    /// Adding the dependency would make the escrow follow itself.
    #[error("Dependency 0x{} already follows this escrow", hex::encode(.0))]
    DependencyCycle(Address),

    /// Receipt deadline has not passed yet.
    #[error("Deadline not reached: deadline={deadline}, now={now}")]
    DeadlineNotReached {
        /// Receipt deadline
        deadline: Timestamp,
        /// Current time
        now: Timestamp,
    },

    /// Dispute raised after evidence retention can no longer be guaranteed.
    #[error("Dispute window closed: deadline={deadline}, closed at {closes_at}, now={now}")]
    DisputeWindowClosed {
        /// Receipt deadline
        deadline: Timestamp,
        /// First time at which disputes are rejected
        closes_at: Timestamp,
        /// Current time
        now: Timestamp,
    },

    /// Execution recorded outside `[deadline - interval / 2, deadline]`.
    #[error("Execution outside window: opens at {opens_at}, deadline={deadline}, now={now}")]
    ExecutionOutsideWindow {
        /// First time at which execution may be recorded
        opens_at: Timestamp,
        /// Receipt deadline
        deadline: Timestamp,
        /// Current time
        now: Timestamp,
    },

    /// Evidence timestamps must be positive.
    #[error("Evidence timestamp must be positive")]
    ZeroTimestamp,

    /// Grace period for payment has not elapsed.
    #[error("Grace period active: pay by {pay_by_deadline}, now={now}")]
    GracePeriodActive {
        /// Payment deadline
        pay_by_deadline: Timestamp,
        /// Current time
        now: Timestamp,
    },

    /// Escrow withdrawal timer has not elapsed.
    #[error("Withdrawal not ready: ready at {ready_at}, now={now}")]
    WithdrawalNotReady {
        /// Time after which withdrawal is allowed
        ready_at: Timestamp,
        /// Current time
        now: Timestamp,
    },

    /// Receipt promises nothing.
    #[error("Compensation amount is zero")]
    ZeroCompensation,

    /// Deposit of nothing.
    #[error("Deposit amount is zero")]
    ZeroDeposit,

    /// Attached payment differs from the promised amount.
    #[error("Payment mismatch: expected {expected}, attached {attached}")]
    PaymentMismatch {
        /// Promised amount
        expected: Amount,
        /// Attached amount
        attached: Amount,
    },

    /// A claim for this receipt already exists.
    #[error("Compensation already requested for {0}")]
    ClaimExists(ReceiptId),

    /// Dependency is already registered.
    #[error("Dependency 0x{} already registered", hex::encode(.0))]
    DuplicateDependency(Address),

    /// Signature could not be parsed or recovered.
    #[error("Invalid receipt signature: {0}")]
    InvalidSignature(String),

    /// Signature recovers to someone other than the receipt signer.
    #[error(
        "Receipt signer mismatch: expected 0x{}, recovered 0x{}",
        hex::encode(.expected),
        hex::encode(.recovered)
    )]
    SignerMismatch {
        /// Configured signer
        expected: Address,
        /// Recovered signer
        recovered: Address,
    },

    /// Caller is not the escrow administrator.
    #[error("Unauthorized caller 0x{}", hex::encode(.0))]
    Unauthorized(Address),

    /// The relayer recorded execution in time.
    #[error("Evidence found: {id} executed at {executed_at}, deadline {deadline}")]
    EvidenceFound {
        /// Receipt identifier
        id: ReceiptId,
        /// Recorded execution time
        executed_at: Timestamp,
        /// Receipt deadline
        deadline: Timestamp,
    },

    /// Claim is not in the status the operation requires.
    #[error("Invalid status for {id}: expected {expected:?}, found {actual:?}")]
    InvalidStatus {
        /// Receipt identifier
        id: ReceiptId,
        /// Status the operation requires
        expected: CompensationStatus,
        /// Current status
        actual: CompensationStatus,
    },

    /// Registry has not been initialized.
    #[error("Evidence registry not initialized")]
    RegistryNotInitialized,

    /// Registry initialization attempted twice.
    #[error("Evidence registry already initialized")]
    RegistryAlreadyInitialized,

    /// Dependency reports locked at add-time.
    #[error("Dependency 0x{} is already locked", hex::encode(.0))]
    DependencyLocked(Address),

    /// Withdrawal was never requested.
    #[error("Withdrawal not requested")]
    WithdrawalNotRequested,

    /// Escrow or one of its dependencies is locked.
    #[error("Escrow is locked")]
    EscrowLocked,

    /// Value transfer collaborator rejected the payout.
    #[error("Transfer failed: {0}")]
    TransferFailed(String),
}

impl AccountabilityError {
    /// Abstract kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RegistryMismatch { .. } | Self::SelfDependency(_) | Self::DependencyCycle(_) => {
                ErrorKind::AddressMismatch
            }
            Self::DeadlineNotReached { .. }
            | Self::DisputeWindowClosed { .. }
            | Self::ExecutionOutsideWindow { .. }
            | Self::ZeroTimestamp
            | Self::GracePeriodActive { .. }
            | Self::WithdrawalNotReady { .. } => ErrorKind::TimingViolation,
            Self::ZeroCompensation | Self::ZeroDeposit | Self::PaymentMismatch { .. } => {
                ErrorKind::PaymentMismatch
            }
            Self::ClaimExists(_) | Self::DuplicateDependency(_) => ErrorKind::DuplicateEntry,
            Self::InvalidSignature(_) | Self::SignerMismatch { .. } | Self::Unauthorized(_) => {
                ErrorKind::AuthenticationFailure
            }
            Self::EvidenceFound { .. }
            | Self::InvalidStatus { .. }
            | Self::RegistryNotInitialized
            | Self::RegistryAlreadyInitialized
            | Self::DependencyLocked(_)
            | Self::WithdrawalNotRequested
            | Self::EscrowLocked
            | Self::TransferFailed(_) => ErrorKind::StateViolation,
        }
    }
}
