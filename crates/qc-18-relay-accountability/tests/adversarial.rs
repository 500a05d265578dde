//! # Adversarial Tests for Relay Accountability (qc-18)
//!
//! These tests attempt to break the protocol's safety properties.
//!
//! ## Test Categories
//!
//! 1. **Races** - concurrent claims, concurrent records during rotation
//! 2. **Reentrancy** - payout recipient calling back into the adjudicator
//! 3. **State Machine** - only forward transitions, monotonic latch
//! 4. **Lock Aggregation** - escrow lock is the OR of its dependencies
//! 5. **Dependency Cycles** - escrows that would follow themselves
//! 6. **Early Execution** - evidence outliving every claimable instant

use qc_18_relay_accountability::{
    sign_receipt, AccountabilityConfig, AccountabilityError, Address, Adjudicator,
    CompensationStatus, EscrowGuard, EvidenceRegistry, EvidenceStore, InMemoryLedger, LockLatch,
    LockSource, ManualTimeSource, Receipt, ReceiptBuilder, ReceiptId, RecordingPublisher,
    TransferError, ValueTransfer, SHARD_COUNT,
};
use shared_crypto::Secp256k1KeyPair;
use std::sync::{mpsc, Arc, Barrier, OnceLock, Weak};
use std::thread;
use std::time::Duration;

// =============================================================================
// TEST HELPERS
// =============================================================================

const REGISTRY: Address = [0xEE; 20];
const ADJUDICATOR: Address = [0xAD; 20];
const ESCROW: Address = [0xE5; 20];
const ADMIN: Address = [0xA1; 20];

fn signer() -> Secp256k1KeyPair {
    Secp256k1KeyPair::from_bytes([0x5E; 32]).unwrap()
}

fn registry(clock: &Arc<ManualTimeSource>, interval: u64) -> Arc<EvidenceRegistry> {
    let registry = Arc::new(EvidenceRegistry::new(
        REGISTRY,
        clock.clone(),
        Arc::new(RecordingPublisher::new()),
    ));
    registry.initialize(interval).unwrap();
    registry
}

fn adjudicator(
    clock: &Arc<ManualTimeSource>,
    registry: Arc<EvidenceRegistry>,
    ledger: Arc<dyn ValueTransfer>,
) -> Arc<Adjudicator> {
    let config = AccountabilityConfig {
        receipt_signer: signer().address(),
        ..Default::default()
    };
    Arc::new(
        Adjudicator::new(
            ADJUDICATOR,
            config,
            registry,
            clock.clone(),
            ledger,
            Arc::new(RecordingPublisher::new()),
        )
        .unwrap(),
    )
}

fn receipt(user: u8, deadline: u64) -> Receipt {
    ReceiptBuilder::new(REGISTRY, [user; 20], deadline)
        .compensation_amount(1_000 + user as u128)
        .build()
}

/// Lock source whose latch is tripped directly by the test.
struct Switch {
    address: Address,
    latch: LockLatch,
}

impl Switch {
    fn new(byte: u8) -> Arc<Self> {
        Arc::new(Self {
            address: [byte; 20],
            latch: LockLatch::new(),
        })
    }
}

impl LockSource for Switch {
    fn address(&self) -> Address {
        self.address
    }

    fn is_locked(&self) -> bool {
        self.latch.is_set()
    }
}

/// Deterministic xorshift sequence for operation fuzzing.
struct Xorshift(u64);

impl Xorshift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }
}

// =============================================================================
// RACES
// =============================================================================

#[test]
fn test_concurrent_requests_single_winner() {
    let clock = Arc::new(ManualTimeSource::new(0));
    let reg = registry(&clock, 6000);
    let adj = adjudicator(&clock, reg, Arc::new(InMemoryLedger::new()));
    let r = receipt(1, 1000);
    let sig = sign_receipt(&signer(), &r).unwrap();
    clock.set(1001);

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let adj = adj.clone();
            let r = r.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                adj.request_compensation(&r, &sig)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(AccountabilityError::ClaimExists(_))))
        .count();

    assert_eq!(winners, 1);
    assert_eq!(duplicates, threads - 1);
    assert_eq!(adj.status(&r.id()), CompensationStatus::Pending);
}

#[test]
fn test_concurrent_records_single_winner() {
    let clock = Arc::new(ManualTimeSource::new(1));
    let reg = registry(&clock, 6000);
    let id = ReceiptId([0x77; 32]);

    let threads = 8u64;
    let barrier = Arc::new(Barrier::new(threads as usize));
    let handles: Vec<_> = (1..=threads)
        .map(|ts| {
            let reg = reg.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                (ts, reg.record_if_absent(id, ts * 10).unwrap())
            })
        })
        .collect();

    let winners: Vec<u64> = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|(_, written)| *written)
        .map(|(ts, _)| ts * 10)
        .collect();

    assert_eq!(winners.len(), 1);
    assert_eq!(reg.fetch(0, &id), Some(winners[0]));
}

#[test]
fn test_rotation_never_loses_concurrent_records() {
    let clock = Arc::new(ManualTimeSource::new(1));
    let reg = registry(&clock, 100);

    let writers = 4u8;
    let per_writer = 200u16;
    let barrier = Arc::new(Barrier::new(writers as usize + 1));

    let mut handles = Vec::new();
    for w in 0..writers {
        let reg = reg.clone();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            for n in 0..per_writer {
                let mut bytes = [0u8; 32];
                bytes[0] = w;
                bytes[1..3].copy_from_slice(&n.to_be_bytes());
                reg.record_if_absent(ReceiptId(bytes), 1).unwrap();
            }
        }));
    }

    let rotator = {
        let reg = reg.clone();
        let clock = clock.clone();
        let barrier = barrier.clone();
        thread::spawn(move || {
            barrier.wait();
            // Exactly one rotation becomes due; nothing can be evicted twice.
            clock.set(101);
            reg.rotate();
        })
    };

    for h in handles {
        h.join().unwrap();
    }
    rotator.join().unwrap();

    for w in 0..writers {
        for n in 0..per_writer {
            let mut bytes = [0u8; 32];
            bytes[0] = w;
            bytes[1..3].copy_from_slice(&n.to_be_bytes());
            assert!(
                reg.locate(&ReceiptId(bytes)).is_some(),
                "record {}/{} lost during rotation",
                w,
                n
            );
        }
    }
    let total: usize = (0..SHARD_COUNT).filter_map(|i| reg.shard_len(i)).sum();
    assert_eq!(total, writers as usize * per_writer as usize);
}

#[test]
fn test_latch_race_emits_single_transition() {
    let latch = Arc::new(LockLatch::new());
    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let latch = latch.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                latch.trip()
            })
        })
        .collect();

    let flips = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|flipped| *flipped)
        .count();
    assert_eq!(flips, 1);
    assert!(latch.is_set());
}

// =============================================================================
// REENTRANCY
// =============================================================================

/// Ledger whose recipient calls `withdraw_compensation` again while being paid.
struct ReentrantLedger {
    inner: InMemoryLedger,
    target: OnceLock<(Weak<Adjudicator>, Receipt)>,
    reentry: OnceLock<Result<(), String>>,
}

impl ValueTransfer for ReentrantLedger {
    fn accept(&self, holder: Address, amount: u128) -> Result<(), TransferError> {
        self.inner.accept(holder, amount)
    }

    fn transfer(&self, from: Address, to: Address, amount: u128) -> Result<(), TransferError> {
        if let Some((adjudicator, receipt)) = self.target.get() {
            if let Some(adjudicator) = adjudicator.upgrade() {
                let nested = adjudicator
                    .withdraw_compensation(receipt)
                    .map_err(|e| e.to_string());
                let _ = self.reentry.set(nested);
            }
        }
        self.inner.transfer(from, to, amount)
    }
}

#[test]
fn test_reentrant_withdraw_pays_once() {
    let clock = Arc::new(ManualTimeSource::new(0));
    let reg = registry(&clock, 6000);
    let ledger = Arc::new(ReentrantLedger {
        inner: InMemoryLedger::new(),
        target: OnceLock::new(),
        reentry: OnceLock::new(),
    });
    let adj = adjudicator(&clock, reg, ledger.clone());
    let r = receipt(1, 1000);

    clock.set(1001);
    adj.request_compensation(&r, &sign_receipt(&signer(), &r).unwrap())
        .unwrap();
    adj.issue_compensation(&r, r.compensation_amount).unwrap();

    let _ = ledger.target.set((Arc::downgrade(&adj), r.clone()));
    adj.withdraw_compensation(&r).unwrap();

    let nested = ledger.reentry.get().unwrap();
    assert!(nested.is_err(), "reentrant withdrawal must be rejected");
    assert_eq!(ledger.inner.payouts().len(), 1);
    assert_eq!(ledger.inner.balance_of(&r.sender), r.compensation_amount);
    assert_eq!(adj.status(&r.id()), CompensationStatus::Resolved);
}

// =============================================================================
// STATE MACHINE
// =============================================================================

#[test]
fn test_fuzzed_operations_follow_forward_transitions() {
    let clock = Arc::new(ManualTimeSource::new(0));
    let reg = registry(&clock, 6000);
    let ledger = Arc::new(InMemoryLedger::new());
    let adj = adjudicator(&clock, reg.clone(), ledger.clone());
    let key = signer();

    let receipts: Vec<Receipt> = (1..=6).map(|u| receipt(u, 1000)).collect();
    let mut last: Vec<CompensationStatus> = vec![CompensationStatus::None; receipts.len()];
    let mut rng = Xorshift(0x9E37_79B9_7F4A_7C15);
    let mut was_locked = false;

    clock.set(990);
    for step in 0..2_000u64 {
        if step % 40 == 0 {
            clock.advance(7);
        }
        let i = (rng.next() % receipts.len() as u64) as usize;
        let r = &receipts[i];
        let _ = match rng.next() % 6 {
            0 => reg.record_execution(r).map(|_| ()),
            1 => adj
                .request_compensation(r, &sign_receipt(&key, r).unwrap())
                .map(|_| ()),
            2 => adj.issue_compensation(r, r.compensation_amount),
            3 => adj.issue_compensation(r, r.compensation_amount + 1),
            4 => adj.withdraw_compensation(r),
            _ => adj.lock(r),
        };

        for (j, r) in receipts.iter().enumerate() {
            let now = adj.status(&r.id());
            assert!(
                now == last[j] || last[j].can_transition_to(now),
                "illegal transition {:?} -> {:?}",
                last[j],
                now
            );
            last[j] = now;
        }

        if was_locked {
            assert!(adj.is_locked());
        }
        was_locked = adj.is_locked();
    }

    let resolved = last
        .iter()
        .filter(|s| **s == CompensationStatus::Resolved)
        .count();
    assert_eq!(ledger.payouts().len(), resolved);
    assert_eq!(adj.held_balance() > 0, last.contains(&CompensationStatus::Compensated));
}

#[test]
fn test_fetch_never_fails_for_any_index() {
    let clock = Arc::new(ManualTimeSource::new(1));
    let reg = registry(&clock, 10);
    let id = ReceiptId([0x42; 32]);
    reg.record_if_absent(id, 1).unwrap();

    for t in [5u64, 11, 21, 31] {
        clock.set(t);
        reg.rotate();
        for index in 0..SHARD_COUNT + 4 {
            let _ = reg.fetch(index, &id);
        }
        assert_eq!(reg.fetch(SHARD_COUNT, &id), None);
    }
}

// =============================================================================
// LOCK AGGREGATION
// =============================================================================

#[test]
fn test_escrow_lock_is_or_of_dependencies() {
    for count in 0..=4u8 {
        for mask in 0u32..(1 << count) {
            let clock = Arc::new(ManualTimeSource::new(0));
            let escrow = EscrowGuard::new(
                ESCROW,
                ADMIN,
                600,
                clock,
                Arc::new(InMemoryLedger::new()),
                Arc::new(RecordingPublisher::new()),
            );
            let switches: Vec<_> = (0..count).map(|i| Switch::new(i + 1)).collect();
            for s in &switches {
                escrow.add_dependency(ADMIN, s.clone()).unwrap();
            }
            for (i, s) in switches.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    s.latch.trip();
                }
            }
            assert_eq!(
                escrow.is_locked(),
                mask != 0,
                "count={} mask={:b}",
                count,
                mask
            );
        }
    }
}

#[test]
fn test_nested_escrows_propagate_lock() {
    let clock = Arc::new(ManualTimeSource::new(0));
    let make = |byte: u8| {
        Arc::new(EscrowGuard::new(
            [byte; 20],
            ADMIN,
            600,
            clock.clone(),
            Arc::new(InMemoryLedger::new()),
            Arc::new(RecordingPublisher::new()),
        ))
    };
    let inner = make(0x01);
    let outer = make(0x02);
    let source = Switch::new(0x03);

    inner.add_dependency(ADMIN, source.clone()).unwrap();
    outer.add_dependency(ADMIN, inner.clone()).unwrap();
    assert!(!outer.is_locked());

    source.latch.trip();
    assert!(inner.is_locked());
    assert!(outer.is_locked());
}

#[test]
fn test_locked_adjudicator_cannot_be_adopted() {
    let clock = Arc::new(ManualTimeSource::new(0));
    let reg = registry(&clock, 6000);
    let adj = adjudicator(&clock, reg, Arc::new(InMemoryLedger::new()));
    let r = receipt(1, 1000);

    clock.set(1001);
    adj.request_compensation(&r, &sign_receipt(&signer(), &r).unwrap())
        .unwrap();
    clock.set(1200);
    adj.lock(&r).unwrap();

    let escrow = EscrowGuard::new(
        ESCROW,
        ADMIN,
        600,
        clock,
        Arc::new(InMemoryLedger::new()),
        Arc::new(RecordingPublisher::new()),
    );
    assert!(matches!(
        escrow.add_dependency(ADMIN, adj),
        Err(AccountabilityError::DependencyLocked(_))
    ));
    assert!(!escrow.is_locked());
}

// =============================================================================
// DEPENDENCY CYCLES
// =============================================================================

fn escrow_at(clock: &Arc<ManualTimeSource>, byte: u8) -> Arc<EscrowGuard> {
    Arc::new(EscrowGuard::new(
        [byte; 20],
        ADMIN,
        600,
        clock.clone(),
        Arc::new(InMemoryLedger::new()),
        Arc::new(RecordingPublisher::new()),
    ))
}

#[test]
fn test_mutual_escrow_dependency_returns_error() {
    let clock = Arc::new(ManualTimeSource::new(0));
    let a = escrow_at(&clock, 0x0A);
    let b = escrow_at(&clock, 0x0B);
    b.add_dependency(ADMIN, a.clone()).unwrap();

    let (tx, rx) = mpsc::channel();
    let (a2, b2) = (a.clone(), b.clone());
    thread::spawn(move || {
        let _ = tx.send(a2.add_dependency(ADMIN, b2).map_err(|e| e.to_string()));
    });

    let outcome = rx
        .recv_timeout(Duration::from_secs(3))
        .expect("add_dependency did not return");
    assert!(outcome.is_err());
    assert!(a.dependency_addresses().is_empty());
    assert!(!a.is_locked());
    assert!(!b.is_locked());
}

#[test]
fn test_concurrent_cross_dependencies_single_winner() {
    for _ in 0..50 {
        let clock = Arc::new(ManualTimeSource::new(0));
        let a = escrow_at(&clock, 0x0A);
        let b = escrow_at(&clock, 0x0B);
        let barrier = Arc::new(Barrier::new(2));

        let spawn = |from: Arc<EscrowGuard>, to: Arc<EscrowGuard>| {
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                from.add_dependency(ADMIN, to).is_ok()
            })
        };
        let first = spawn(a.clone(), b.clone());
        let second = spawn(b.clone(), a.clone());
        let wins = [first.join().unwrap(), second.join().unwrap()];

        assert_eq!(wins.iter().filter(|w| **w).count(), 1);
        assert!(!(a.depends_on(&[0x0B; 20]) && b.depends_on(&[0x0A; 20])));
        assert!(!a.is_locked());
    }
}

// =============================================================================
// EARLY EXECUTION
// =============================================================================

#[test]
fn test_accepted_execution_survives_every_claimable_instant() {
    const INTERVAL: u64 = 100;
    const DEADLINE: u64 = 250;
    let key = signer();

    for executed_at in 1..=DEADLINE + 10 {
        let clock = Arc::new(ManualTimeSource::new(1));
        let reg = registry(&clock, INTERVAL);
        let adj = adjudicator(&clock, reg.clone(), Arc::new(InMemoryLedger::new()));
        let r = receipt(1, DEADLINE);

        clock.set(executed_at);
        let accepted = reg.record_execution(&r).is_ok();
        assert_eq!(
            accepted,
            (DEADLINE - INTERVAL / 2..=DEADLINE).contains(&executed_at),
            "execution at {}",
            executed_at
        );

        // Rotate as often as the interval allows, up to the last claimable block.
        let last_claim = DEADLINE + INTERVAL / 2 - 1;
        for t in executed_at..=last_claim {
            clock.set(t);
            reg.rotate();
        }

        let claim = adj.request_compensation(&r, &sign_receipt(&key, &r).unwrap());
        if accepted {
            assert!(
                matches!(claim, Err(AccountabilityError::EvidenceFound { .. })),
                "execution at {} lost before {}",
                executed_at,
                last_claim
            );
        } else {
            assert!(claim.is_ok(), "execution at {}: {:?}", executed_at, claim);
        }
    }
}
