use oracle_pusher_sdk::{FeedId, UpdateOperation};

/// Ordered update operations destined for one transaction.
///
/// Never longer than the active strategy's per-transaction capacity.
#[derive(Debug, Clone)]
pub struct TransactionBundle {
    pub operations: Vec<UpdateOperation>,
}

impl TransactionBundle {
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn feed_ids(&self) -> impl Iterator<Item = FeedId> + '_ {
        self.operations.iter().map(|op| op.feed_id)
    }
}

/// Ordered transaction bundles submitted to the relay as one atomic unit.
///
/// Under the direct strategy there is exactly one unbounded batch; under the
/// bundled strategy each batch holds at most the relay's bundle size.
#[derive(Debug, Clone)]
pub struct SubmissionBatch {
    pub bundles: Vec<TransactionBundle>,
}

impl SubmissionBatch {
    pub fn transaction_count(&self) -> usize {
        self.bundles.len()
    }

    pub fn operation_count(&self) -> usize {
        self.bundles.iter().map(TransactionBundle::len).sum()
    }
}

/// Partition operations, in input order, into chunks of at most
/// `max_ops_per_tx`. The last chunk may be smaller; concatenating the chunks
/// reproduces the input exactly.
pub fn group_into_bundles(
    operations: Vec<UpdateOperation>,
    max_ops_per_tx: usize,
) -> Vec<TransactionBundle> {
    let max_ops_per_tx = max_ops_per_tx.max(1);
    let mut bundles = Vec::with_capacity(operations.len().div_ceil(max_ops_per_tx));

    let mut operations = operations.into_iter().peekable();
    while operations.peek().is_some() {
        bundles.push(TransactionBundle {
            operations: operations.by_ref().take(max_ops_per_tx).collect(),
        });
    }

    bundles
}

/// Partition bundles, in order, into relay-sized atomic batches of at most
/// `max_bundle_size` transactions each.
pub fn group_into_batches(
    bundles: Vec<TransactionBundle>,
    max_bundle_size: usize,
) -> Vec<SubmissionBatch> {
    let max_bundle_size = max_bundle_size.max(1);
    let mut batches = Vec::with_capacity(bundles.len().div_ceil(max_bundle_size));

    let mut bundles = bundles.into_iter().peekable();
    while bundles.peek().is_some() {
        batches.push(SubmissionBatch {
            bundles: bundles.by_ref().take(max_bundle_size).collect(),
        });
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_pusher_sdk::{build_update_operations, AddressFinder, AttestationBlob};
    use solana_sdk::pubkey::Pubkey;

    fn operations(count: u8) -> Vec<UpdateOperation> {
        let feed_ids: Vec<FeedId> = (1..=count).map(|i| FeedId::new([i; 32])).collect();
        let blob = AttestationBlob::from_segments(
            feed_ids.iter().map(|id| (*id, vec![id.as_ref()[0]; 8])).collect(),
        );
        build_update_operations(
            &feed_ids,
            &blob,
            &AddressFinder::default(),
            &Pubkey::new_unique(),
            0,
        )
        .unwrap()
    }

    fn flatten(bundles: &[TransactionBundle]) -> Vec<FeedId> {
        bundles.iter().flat_map(|b| b.feed_ids()).collect()
    }

    #[test]
    fn test_empty_input_yields_no_bundles() {
        assert!(group_into_bundles(vec![], 7).is_empty());
    }

    #[test]
    fn test_eight_operations_at_capacity_seven() {
        let ops = operations(8);
        let original: Vec<FeedId> = ops.iter().map(|op| op.feed_id).collect();

        let bundles = group_into_bundles(ops, 7);

        assert_eq!(bundles.len(), 2);
        assert_eq!(bundles[0].len(), 7);
        assert_eq!(bundles[1].len(), 1);
        assert_eq!(flatten(&bundles), original);
    }

    #[test]
    fn test_bundle_count_is_ceil_of_input_over_capacity() {
        for (count, capacity, expected) in [(1u8, 7usize, 1usize), (7, 7, 1), (14, 7, 2), (15, 7, 3), (20, 11, 2)] {
            let bundles = group_into_bundles(operations(count), capacity);
            assert_eq!(bundles.len(), expected, "count={count} capacity={capacity}");
            assert!(bundles.iter().all(|b| b.len() <= capacity));
        }
    }

    #[test]
    fn test_concatenated_bundles_reproduce_input_order() {
        let ops = operations(23);
        let original: Vec<FeedId> = ops.iter().map(|op| op.feed_id).collect();

        let bundles = group_into_bundles(ops, 7);

        assert_eq!(flatten(&bundles), original);
    }

    #[test]
    fn test_zero_capacity_is_treated_as_one() {
        let bundles = group_into_bundles(operations(3), 0);
        assert_eq!(bundles.len(), 3);
    }

    #[test]
    fn test_batches_respect_bundle_size_and_order() {
        let bundles = group_into_bundles(operations(21), 7);
        assert_eq!(bundles.len(), 3);

        let batches = group_into_batches(bundles, 2);

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].transaction_count(), 2);
        assert_eq!(batches[1].transaction_count(), 1);
        assert_eq!(batches[0].operation_count(), 14);
        assert_eq!(batches[1].operation_count(), 7);
    }
}
