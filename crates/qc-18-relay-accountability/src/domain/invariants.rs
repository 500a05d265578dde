//! # Domain Invariants
//!
//! Timing and payment rules shared by the adjudicator and the escrow guard.

use super::entities::Receipt;
use super::errors::{AccountabilityError, Address, Amount, Timestamp};

/// Number of shards kept by an evidence registry.
pub const SHARD_COUNT: usize = 2;

/// First time at which a dispute for `deadline` is rejected.
///
/// Half the shard interval is left for the relayer to execute; the other half
/// for the user to react. Evidence is retained for one full interval, so a
/// dispute raised before this point always sees every record written on time.
pub fn dispute_window_end(deadline: Timestamp, interval: Timestamp) -> Timestamp {
    deadline.saturating_add(interval / 2)
}

/// First time at which execution of a job due at `deadline` may be recorded.
///
/// A record lives for at least one interval after it is written, so writing
/// no earlier than this keeps it retrievable until [`dispute_window_end`].
pub fn execution_window_start(deadline: Timestamp, interval: Timestamp) -> Timestamp {
    deadline.saturating_sub(interval / 2)
}

/// Invariant: execution is recorded within
/// `[deadline - interval / 2, deadline]`.
pub fn invariant_execution_window(
    deadline: Timestamp,
    interval: Timestamp,
    now: Timestamp,
) -> Result<(), AccountabilityError> {
    let opens_at = execution_window_start(deadline, interval);
    if now < opens_at || now > deadline {
        return Err(AccountabilityError::ExecutionOutsideWindow {
            opens_at,
            deadline,
            now,
        });
    }
    Ok(())
}

/// Invariant: receipt is bound to this registry.
pub fn invariant_registry_match(
    receipt: &Receipt,
    registry: &Address,
) -> Result<(), AccountabilityError> {
    if receipt.registry_address != *registry {
        return Err(AccountabilityError::RegistryMismatch {
            expected: *registry,
            actual: receipt.registry_address,
        });
    }
    Ok(())
}

/// Invariant: the job's service window has elapsed (`now > deadline`).
pub fn invariant_deadline_passed(
    deadline: Timestamp,
    now: Timestamp,
) -> Result<(), AccountabilityError> {
    if now <= deadline {
        return Err(AccountabilityError::DeadlineNotReached { deadline, now });
    }
    Ok(())
}

/// Invariant: dispute raised while evidence is still retrievable
/// (`deadline + interval / 2 > now`).
pub fn invariant_dispute_window_open(
    deadline: Timestamp,
    interval: Timestamp,
    now: Timestamp,
) -> Result<(), AccountabilityError> {
    let closes_at = dispute_window_end(deadline, interval);
    if closes_at <= now {
        return Err(AccountabilityError::DisputeWindowClosed {
            deadline,
            closes_at,
            now,
        });
    }
    Ok(())
}

/// Invariant: attached value equals the promised amount exactly.
pub fn invariant_exact_payment(
    expected: Amount,
    attached: Amount,
) -> Result<(), AccountabilityError> {
    if expected != attached {
        return Err(AccountabilityError::PaymentMismatch { expected, attached });
    }
    Ok(())
}

/// Invariant: recorded execution counts as evidence only if it is not late.
pub fn invariant_executed_in_time(executed_at: Timestamp, deadline: Timestamp) -> bool {
    executed_at <= deadline
}
