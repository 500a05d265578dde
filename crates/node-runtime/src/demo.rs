//! # Dispute Walkthrough
//!
//! Replays the three outcomes a receipt can have against a freshly wired node:
//!
//! - executed on time: the claim is rejected by evidence
//! - executed late and paid: compensation reaches the user once
//! - executed late and never paid: the adjudicator locks and the escrow freezes

use crate::config::RuntimeConfig;
use crate::container::RelayNode;
use anyhow::{bail, Context, Result};
use qc_18_relay_accountability::{
    sign_receipt, AccountabilityError, Address, Amount, Receipt, ReceiptBuilder, TimeSource,
};
use shared_crypto::Secp256k1KeyPair;
use tracing::{info, warn};

/// Account that funds the escrow and pays claims.
pub const RELAYER: Address = [0x22u8; 20];

/// Escrow deposit made before any job runs.
pub const RELAYER_BOND: Amount = 1_000_000;

/// Compensation promised by every demo receipt.
pub const COMPENSATION: Amount = 5_000;

/// Outcome of [`run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DemoReport {
    /// Claims refused because evidence existed.
    pub rejected_claims: usize,
    /// Claims paid out to their beneficiary.
    pub resolved_claims: usize,
    /// Whether the escrow ended up frozen.
    pub escrow_locked: bool,
    /// Funds left in escrow.
    pub escrow_balance: Amount,
    /// Total paid to users.
    pub paid_to_users: Amount,
}

fn receipt(config: &RuntimeConfig, user: u8, deadline: u64) -> Receipt {
    ReceiptBuilder::new(config.registry_address, [user; 20], deadline)
        .target([0x33; 20])
        .payload(vec![user])
        .compensation_amount(COMPENSATION)
        .gas_limit(100_000)
        .build()
}

/// Drive `node` through the walkthrough.
pub fn run(node: &RelayNode, config: &RuntimeConfig) -> Result<DemoReport> {
    let signer = Secp256k1KeyPair::from_bytes(config.signer_key)?;
    let clock = node.clock();
    let start = clock.now();
    let deadline = start + 1_000;

    node.escrow().deposit(RELAYER, RELAYER_BOND)?;
    node.escrow().request_withdrawal(config.admin)?;

    let on_time = receipt(config, 0x11, deadline);
    let paid = receipt(config, 0x12, deadline);
    let unpaid = receipt(config, 0x13, deadline);
    let receipts = [&on_time, &paid, &unpaid];

    clock.set(deadline - 5);
    node.registry().record_execution(&on_time)?;
    info!("Job 0x{} executed at {}", on_time.id().short(), deadline - 5);

    clock.set(deadline + 1);
    let mut rejected_claims = 0;
    for r in receipts {
        let signature = sign_receipt(&signer, r)?;
        match node.adjudicator().request_compensation(r, &signature) {
            Ok(id) => info!("Claim opened for 0x{}", id.short()),
            Err(AccountabilityError::EvidenceFound { id, executed_at, .. }) => {
                info!("Claim for 0x{} refused, executed at {}", id.short(), executed_at);
                rejected_claims += 1;
            }
            Err(e) => return Err(e).context("opening claim"),
        }
    }

    clock.advance(config.accountability.compensation_period / 2);
    node.adjudicator()
        .issue_compensation(&paid, paid.compensation_amount)
        .context("relayer paying claim")?;
    node.adjudicator()
        .withdraw_compensation(&paid)
        .context("user withdrawing compensation")?;

    clock.set(deadline + 1 + config.accountability.compensation_period + 1);
    for id in node.adjudicator().overdue_claims() {
        let Some(r) = receipts.iter().find(|r| r.id() == id) else {
            continue;
        };
        node.adjudicator().lock(r).context("locking unpaid claim")?;
    }
    node.escrow().latch();

    let ready_at = start + config.accountability.withdrawal_period;
    clock.set(clock.now().max(ready_at) + 1);
    match node.escrow().withdraw(config.admin) {
        Ok(amount) => warn!("Escrow released {} despite unpaid claim", amount),
        Err(e) => info!("Escrow withdrawal refused: {}", e),
    }

    if !node.adjudicator().is_locked() {
        bail!("unpaid claim did not lock the adjudicator");
    }

    Ok(DemoReport {
        rejected_claims,
        resolved_claims: node.ledger().payouts().len(),
        escrow_locked: node.escrow().is_locked(),
        escrow_balance: node.escrow().balance(),
        paid_to_users: receipts
            .iter()
            .map(|r| node.ledger().balance_of(&r.sender))
            .sum(),
    })
}
