//! # Escrow Guard
//!
//! Holds deposits and gates their withdrawal on the lock state of every
//! registered dependency. The lock state is recomputed on every call since a
//! dependency can trip at any time.

use crate::domain::{AccountabilityError, Address, Amount, LockLatch, Timestamp};
use crate::events::AccountabilityEvent;
use crate::ports::inbound::LockSource;
use crate::ports::outbound::{EventPublisher, TimeSource, ValueTransfer};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Serializes dependency graph edits across all escrows so a cycle check sees
/// a graph no other edit is changing.
static TOPOLOGY: Mutex<()> = Mutex::new(());

#[derive(Debug, Default)]
struct EscrowState {
    balance: Amount,
    withdrawal_initiated: bool,
    withdrawal_ready_at: Timestamp,
}

/// Deposit holder frozen by any locked dependency.
pub struct EscrowGuard {
    address: Address,
    admin: Address,
    withdrawal_period: Timestamp,
    clock: Arc<dyn TimeSource>,
    ledger: Arc<dyn ValueTransfer>,
    publisher: Arc<dyn EventPublisher>,
    dependencies: RwLock<Vec<Arc<dyn LockSource>>>,
    latch: LockLatch,
    state: Mutex<EscrowState>,
}

impl EscrowGuard {
    /// Create an escrow with no dependencies and an empty balance.
    pub fn new(
        address: Address,
        admin: Address,
        withdrawal_period: Timestamp,
        clock: Arc<dyn TimeSource>,
        ledger: Arc<dyn ValueTransfer>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            address,
            admin,
            withdrawal_period,
            clock,
            ledger,
            publisher,
            dependencies: RwLock::new(Vec::new()),
            latch: LockLatch::new(),
            state: Mutex::new(EscrowState::default()),
        }
    }

    /// Escrow address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Administrator allowed to withdraw.
    pub fn admin(&self) -> Address {
        self.admin
    }

    /// Follow the lock state of `dependency`. Administrator only.
    ///
    /// A dependency that is already locked cannot be adopted, nor one that
    /// already follows this escrow.
    pub fn add_dependency(
        &self,
        caller: Address,
        dependency: Arc<dyn LockSource>,
    ) -> Result<(), AccountabilityError> {
        self.ensure_admin(caller)?;
        let dep_address = dependency.address();
        if dep_address == self.address {
            return Err(AccountabilityError::SelfDependency(dep_address));
        }

        let topology = TOPOLOGY.lock();
        // No lock on `self.dependencies` is held while querying `dependency`.
        if dependency.depends_on(&self.address) {
            warn!(
                "[qc-18] Refusing 0x{}: it already follows escrow 0x{}",
                hex::encode(dep_address),
                hex::encode(self.address)
            );
            return Err(AccountabilityError::DependencyCycle(dep_address));
        }
        if dependency.is_locked() {
            warn!(
                "[qc-18] Refusing locked dependency 0x{}",
                hex::encode(dep_address)
            );
            return Err(AccountabilityError::DependencyLocked(dep_address));
        }
        {
            let mut deps = self.dependencies.write();
            if deps.iter().any(|d| d.address() == dep_address) {
                return Err(AccountabilityError::DuplicateDependency(dep_address));
            }
            deps.push(dependency);
        }
        drop(topology);

        info!(
            "[qc-18] Escrow 0x{} now follows 0x{}",
            hex::encode(self.address),
            hex::encode(dep_address)
        );
        self.emit(AccountabilityEvent::DependencyAdded {
            escrow: self.address,
            dependency: dep_address,
        });
        Ok(())
    }

    /// Addresses of all registered dependencies, in registration order.
    pub fn dependency_addresses(&self) -> Vec<Address> {
        self.dependencies.read().iter().map(|d| d.address()).collect()
    }

    /// Whether `address` is a dependency of this escrow or of any escrow it
    /// follows.
    pub fn depends_on(&self, address: &Address) -> bool {
        self.dependencies
            .read()
            .iter()
            .any(|d| d.address() == *address || d.depends_on(address))
    }

    /// Own latch OR any dependency locked.
    pub fn is_locked(&self) -> bool {
        self.latch.is_set() || self.dependencies.read().iter().any(|d| d.is_locked())
    }

    /// Trip the escrow's own latch if any dependency is locked.
    ///
    /// Anyone may call this. Returns whether the escrow's own latch is set
    /// afterwards.
    pub fn latch(&self) -> bool {
        let tainted = self.dependencies.read().iter().any(|d| d.is_locked());
        if tainted && self.latch.trip() {
            warn!("[qc-18] Escrow 0x{} latched", hex::encode(self.address));
            self.emit(AccountabilityEvent::EscrowLatched {
                escrow: self.address,
            });
        }
        self.latch.is_set()
    }

    /// Credit `amount` from `from` to the escrow balance.
    pub fn deposit(&self, from: Address, amount: Amount) -> Result<(), AccountabilityError> {
        if amount == 0 {
            return Err(AccountabilityError::ZeroDeposit);
        }
        self.ledger
            .accept(self.address, amount)
            .map_err(|e| AccountabilityError::TransferFailed(e.to_string()))?;
        {
            let mut state = self.state.lock();
            state.balance = state.balance.saturating_add(amount);
        }
        debug!(
            "[qc-18] Escrow deposit of {} from 0x{}",
            amount,
            hex::encode(from)
        );
        self.emit(AccountabilityEvent::EscrowDeposit {
            escrow: self.address,
            from,
            amount,
        });
        Ok(())
    }

    /// Current escrow balance.
    pub fn balance(&self) -> Amount {
        self.state.lock().balance
    }

    /// Start the withdrawal timer. Administrator only.
    pub fn request_withdrawal(&self, caller: Address) -> Result<Timestamp, AccountabilityError> {
        self.ensure_admin(caller)?;
        let ready_at = self.clock.now().saturating_add(self.withdrawal_period);
        {
            let mut state = self.state.lock();
            state.withdrawal_initiated = true;
            state.withdrawal_ready_at = ready_at;
        }

        info!("[qc-18] Withdrawal requested, ready after {}", ready_at);
        self.emit(AccountabilityEvent::WithdrawalRequested {
            escrow: self.address,
            ready_at,
        });
        Ok(ready_at)
    }

    /// Pay the whole balance to the administrator.
    ///
    /// Requires a requested withdrawal whose timer has elapsed and no lock
    /// anywhere in the dependency set.
    pub fn withdraw(&self, caller: Address) -> Result<Amount, AccountabilityError> {
        self.ensure_admin(caller)?;
        let now = self.clock.now();

        let (amount, ready_at) = {
            let mut state = self.state.lock();
            if !state.withdrawal_initiated {
                return Err(AccountabilityError::WithdrawalNotRequested);
            }
            if now <= state.withdrawal_ready_at {
                return Err(AccountabilityError::WithdrawalNotReady {
                    ready_at: state.withdrawal_ready_at,
                    now,
                });
            }
            if self.is_locked() {
                warn!(
                    "[qc-18] Withdrawal from escrow 0x{} blocked by lock",
                    hex::encode(self.address)
                );
                return Err(AccountabilityError::EscrowLocked);
            }
            let ready_at = state.withdrawal_ready_at;
            state.withdrawal_initiated = false;
            state.withdrawal_ready_at = 0;
            (std::mem::take(&mut state.balance), ready_at)
        };

        if let Err(e) = self.ledger.transfer(self.address, self.admin, amount) {
            let mut state = self.state.lock();
            state.balance = state.balance.saturating_add(amount);
            state.withdrawal_initiated = true;
            state.withdrawal_ready_at = ready_at;
            warn!("[qc-18] Escrow withdrawal reverted: {}", e);
            return Err(AccountabilityError::TransferFailed(e.to_string()));
        }

        info!(
            "[qc-18] Escrow 0x{} paid {} to 0x{}",
            hex::encode(self.address),
            amount,
            hex::encode(self.admin)
        );
        self.emit(AccountabilityEvent::WithdrawalCompleted {
            escrow: self.address,
            recipient: self.admin,
            amount,
        });
        Ok(amount)
    }

    fn ensure_admin(&self, caller: Address) -> Result<(), AccountabilityError> {
        if caller != self.admin {
            warn!("[qc-18] Unauthorized escrow call from 0x{}", hex::encode(caller));
            return Err(AccountabilityError::Unauthorized(caller));
        }
        Ok(())
    }

    fn emit(&self, event: AccountabilityEvent) {
        if let Err(e) = self.publisher.publish(event) {
            warn!("[qc-18] Failed to publish escrow event: {}", e);
        }
    }
}

impl LockSource for EscrowGuard {
    fn address(&self) -> Address {
        self.address
    }

    fn is_locked(&self) -> bool {
        EscrowGuard::is_locked(self)
    }

    fn depends_on(&self, address: &Address) -> bool {
        EscrowGuard::depends_on(self, address)
    }
}
