//! # Outbound Ports
//!
//! Traits for external dependencies (clock, value transfer, event bus).

use crate::domain::{Address, Amount, Timestamp};
use crate::events::AccountabilityEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// External monotonic clock (block height or equivalent).
pub trait TimeSource: Send + Sync {
    /// Current time.
    fn now(&self) -> Timestamp;
}

/// Externally driven clock, advanced explicitly by the caller.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    time: AtomicU64,
}

impl ManualTimeSource {
    /// Create a clock at `initial`.
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: AtomicU64::new(initial),
        }
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: Timestamp) {
        self.time.fetch_add(delta, Ordering::SeqCst);
    }

    /// Set the clock. Callers must not move it backwards.
    pub fn set(&self, time: Timestamp) {
        self.time.store(time, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        self.time.load(Ordering::SeqCst)
    }
}

/// Error returned by a value transfer collaborator.
#[derive(Debug, Clone, Error)]
pub enum TransferError {
    /// Paying account holds less than the amount.
    #[error("Insufficient funds: holds {available}, requested {requested}")]
    InsufficientFunds {
        /// Balance of the paying account
        available: Amount,
        /// Amount to pay
        requested: Amount,
    },
    /// Recipient refused the transfer.
    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

/// Payment/deposit ledger holding the value components receive and pay out.
///
/// Called as the last step of an operation, after state has been committed.
pub trait ValueTransfer: Send + Sync {
    /// Credit `amount` attached to a call to the account of component `holder`.
    fn accept(&self, holder: Address, amount: Amount) -> Result<(), TransferError>;

    /// Pay `amount` held by component `from` to account `to`.
    fn transfer(&self, from: Address, to: Address, amount: Amount) -> Result<(), TransferError>;
}

/// Error type for publish operations.
#[derive(Debug, Clone, Error)]
pub enum PublishError {
    /// The event bus is not connected.
    #[error("Event bus not connected")]
    NotConnected,
}

/// Event bus sink for accountability notifications.
pub trait EventPublisher: Send + Sync {
    /// Publish an event on its topic.
    fn publish(&self, event: AccountabilityEvent) -> Result<(), PublishError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_time_source() {
        let clock = ManualTimeSource::new(1000);
        assert_eq!(clock.now(), 1000);
        clock.advance(1);
        assert_eq!(clock.now(), 1001);
        clock.set(1101);
        assert_eq!(clock.now(), 1101);
    }
}
