//! # Evidence Lookup
//!
//! Scans a shard ring for proof that a job was executed before its deadline.

use crate::domain::{invariant_executed_in_time, ReceiptId, Shard, Timestamp};

/// First record of `id` across `shards`, newest shard first.
pub fn locate(shards: &[Shard], id: &ReceiptId) -> Option<(usize, Timestamp)> {
    shards
        .iter()
        .enumerate()
        .find_map(|(index, shard)| shard.get(id).map(|ts| (index, ts)))
}

/// First record of `id` that counts as on-time evidence for `deadline`.
///
/// Every shard is consulted: a late record in the current shard does not hide
/// an on-time record in an older one.
pub fn find_qualifying_evidence(
    shards: &[Shard],
    id: &ReceiptId,
    deadline: Timestamp,
) -> Option<(usize, Timestamp)> {
    shards.iter().enumerate().find_map(|(index, shard)| {
        shard
            .get(id)
            .filter(|ts| invariant_executed_in_time(*ts, deadline))
            .map(|ts| (index, ts))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(current: &[(u8, Timestamp)], previous: &[(u8, Timestamp)]) -> Vec<Shard> {
        let mut shard0 = Shard::new(200);
        for (key, ts) in current {
            shard0.insert_if_absent(ReceiptId([*key; 32]), *ts);
        }
        let mut shard1 = Shard::new(100);
        for (key, ts) in previous {
            shard1.insert_if_absent(ReceiptId([*key; 32]), *ts);
        }
        vec![shard0, shard1]
    }

    #[test]
    fn test_empty_ring_has_no_evidence() {
        let shards = ring(&[], &[]);
        assert!(find_qualifying_evidence(&shards, &ReceiptId([1; 32]), 1000).is_none());
    }

    #[test]
    fn test_on_time_record_in_older_shard_found() {
        let shards = ring(&[], &[(1, 150)]);
        assert_eq!(
            find_qualifying_evidence(&shards, &ReceiptId([1; 32]), 1000),
            Some((1, 150))
        );
    }

    #[test]
    fn test_late_record_is_not_evidence() {
        let shards = ring(&[(1, 1001)], &[]);
        assert!(find_qualifying_evidence(&shards, &ReceiptId([1; 32]), 1000).is_none());
        assert_eq!(locate(&shards, &ReceiptId([1; 32])), Some((0, 1001)));
    }

    #[test]
    fn test_late_record_does_not_mask_older_on_time_record() {
        let shards = ring(&[(1, 1500)], &[(1, 900)]);
        assert_eq!(
            find_qualifying_evidence(&shards, &ReceiptId([1; 32]), 1000),
            Some((1, 900))
        );
    }
}
