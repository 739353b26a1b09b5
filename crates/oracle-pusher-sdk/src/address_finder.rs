use crate::FeedId;
use solana_sdk::{pubkey, pubkey::Pubkey};

/// Default receiver program that owns the on-chain price feed accounts.
pub const RECEIVER_PROGRAM_ID: Pubkey = pubkey!("pythWSnswVUd12oZpeFP8e9CVaEqJg25g1Vtc2biRsT");

/// Derives the on-chain addresses this pusher writes to.
///
/// One feed's storage is partitioned into shards to spread update load; the
/// feed account for a shard is the PDA of the little-endian shard id and the
/// feed id under the receiver program.
#[derive(Debug, Clone)]
pub struct AddressFinder {
    pub program_id: Pubkey,
}

impl AddressFinder {
    pub fn new(program_id: Pubkey) -> Self {
        Self { program_id }
    }

    pub fn find_feed_address(&self, shard_id: u16, feed_id: &FeedId) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[&shard_id.to_le_bytes(), feed_id.as_ref()],
            &self.program_id,
        )
    }
}

impl Default for AddressFinder {
    fn default() -> Self {
        Self::new(RECEIVER_PROGRAM_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_address_is_deterministic() {
        let finder = AddressFinder::default();
        let feed = FeedId::new([7u8; 32]);

        let (first, bump_first) = finder.find_feed_address(0, &feed);
        let (second, bump_second) = finder.find_feed_address(0, &feed);

        assert_eq!(first, second);
        assert_eq!(bump_first, bump_second);
    }

    #[test]
    fn test_shards_map_to_distinct_accounts() {
        let finder = AddressFinder::default();
        let feed = FeedId::new([7u8; 32]);

        let (shard_zero, _) = finder.find_feed_address(0, &feed);
        let (shard_one, _) = finder.find_feed_address(1, &feed);

        assert_ne!(shard_zero, shard_one);
    }

    #[test]
    fn test_distinct_feeds_map_to_distinct_accounts() {
        let finder = AddressFinder::default();

        let (a, _) = finder.find_feed_address(0, &FeedId::new([1u8; 32]));
        let (b, _) = finder.find_feed_address(0, &FeedId::new([2u8; 32]));

        assert_ne!(a, b);
    }
}
