//! In-Memory Payment Ledger
//!
//! Implements `ValueTransfer` with per-account balances and a payout journal
//! for auditing. Value accepted by a component is credited to the component's
//! account; payouts debit it.

use crate::domain::{Address, Amount};
use crate::ports::outbound::{TransferError, ValueTransfer};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// A completed payout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payout {
    /// Component that held the funds.
    pub from: Address,
    /// Receiving account.
    pub to: Address,
    /// Amount paid.
    pub amount: Amount,
}

/// In-memory ledger.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balances: RwLock<HashMap<Address, Amount>>,
    journal: RwLock<Vec<Payout>>,
    rejecting: AtomicBool,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance of `account`.
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.read().get(account).copied().unwrap_or(0)
    }

    /// All payouts in the order they happened.
    pub fn payouts(&self) -> Vec<Payout> {
        self.journal.read().clone()
    }

    /// Make subsequent transfers fail (simulates a refusing recipient).
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }
}

impl ValueTransfer for InMemoryLedger {
    fn accept(&self, holder: Address, amount: Amount) -> Result<(), TransferError> {
        let mut balances = self.balances.write();
        let entry = balances.entry(holder).or_insert(0);
        *entry = entry.saturating_add(amount);
        debug!("[qc-18] 0x{} accepted {}", hex::encode(holder), amount);
        Ok(())
    }

    fn transfer(&self, from: Address, to: Address, amount: Amount) -> Result<(), TransferError> {
        if self.rejecting.load(Ordering::SeqCst) {
            warn!("[qc-18] Ledger rejected payout of {} to 0x{}", amount, hex::encode(to));
            return Err(TransferError::Rejected("recipient refused".to_string()));
        }

        {
            let mut balances = self.balances.write();
            let available = balances.get(&from).copied().unwrap_or(0);
            if available < amount {
                warn!(
                    "[qc-18] 0x{} cannot pay {}: holds {}",
                    hex::encode(from),
                    amount,
                    available
                );
                return Err(TransferError::InsufficientFunds {
                    available,
                    requested: amount,
                });
            }
            balances.insert(from, available - amount);
            let entry = balances.entry(to).or_insert(0);
            *entry = entry.saturating_add(amount);
        }
        self.journal.write().push(Payout { from, to, amount });

        debug!(
            "[qc-18] Payout {} from 0x{} to 0x{}",
            amount,
            hex::encode(from),
            hex::encode(to)
        );
        Ok(())
    }
}
