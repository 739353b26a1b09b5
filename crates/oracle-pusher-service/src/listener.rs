use crate::{config::FeedEntry, liveness::LivenessTracker};
use oracle_pusher_sdk::{decode_price_update_account, AddressFinder, FeedId, PriceSnapshot};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Reads the currently stored price for the configured feeds.
///
/// Pure read path, independent of pushing. Absent means "unknown" — the
/// account may not exist yet, or the read may have transiently failed — and
/// is distinct from "known and stale". No read failure ever reaches the
/// caller as an error.
pub struct SolanaPriceListener {
    rpc: Arc<RpcClient>,
    finder: AddressFinder,
    shard_id: u16,
    feeds: Vec<FeedEntry>,
    aliases: HashMap<FeedId, String>,
    commitment: CommitmentConfig,
    latest: RwLock<HashMap<FeedId, PriceSnapshot>>,
    liveness: Arc<LivenessTracker>,
}

impl SolanaPriceListener {
    pub fn new(
        rpc: Arc<RpcClient>,
        finder: AddressFinder,
        shard_id: u16,
        feeds: Vec<FeedEntry>,
        commitment: CommitmentConfig,
        liveness: Arc<LivenessTracker>,
    ) -> Self {
        let aliases = feeds
            .iter()
            .map(|feed| (feed.id, feed.alias.clone()))
            .collect();
        Self {
            rpc,
            finder,
            shard_id,
            feeds,
            aliases,
            commitment,
            latest: RwLock::new(HashMap::new()),
            liveness,
        }
    }

    /// Latest snapshot the network currently stores for `feed_id`, or
    /// `None` if the account does not exist yet or the read failed.
    pub async fn get_on_chain_price_info(&self, feed_id: FeedId) -> Option<PriceSnapshot> {
        let (address, _) = self.finder.find_feed_address(self.shard_id, &feed_id);

        let response = match self
            .rpc
            .get_account_with_commitment(&address, self.commitment)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(feed = self.alias(&feed_id), "on-chain price read failed: {e}");
                return None;
            }
        };

        let account = response.value?;

        match decode_price_update_account(&account.data) {
            Ok(update) => {
                let snapshot = update.snapshot();
                debug!(
                    feed = self.alias(&feed_id),
                    price = snapshot.price,
                    publish_time = snapshot.publish_time,
                    "polled on-chain price"
                );
                Some(snapshot)
            }
            Err(e) => {
                warn!(feed = self.alias(&feed_id), "feed account decode failed: {e}");
                None
            }
        }
    }

    /// Refresh the snapshot cache for every configured feed. Marks the poll
    /// liveness accessor when at least one feed was read successfully.
    pub async fn poll_once(&self) {
        let mut polled = 0usize;
        for feed in &self.feeds {
            if let Some(snapshot) = self.get_on_chain_price_info(feed.id).await {
                self.latest
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(feed.id, snapshot);
                polled += 1;
            }
        }

        if polled > 0 {
            self.liveness.record_poll();
        }
        debug!(polled, feeds = self.feeds.len(), "on-chain poll pass complete");
    }

    /// Most recent snapshot from the poll cache, without a network call.
    pub fn cached_price(&self, feed_id: &FeedId) -> Option<PriceSnapshot> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(feed_id)
            .copied()
    }

    fn alias(&self, feed_id: &FeedId) -> &str {
        self.aliases
            .get(feed_id)
            .map(String::as_str)
            .unwrap_or("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listener() -> SolanaPriceListener {
        let rpc = Arc::new(RpcClient::new("http://127.0.0.1:1".to_string()));
        let feeds = vec![FeedEntry {
            id: FeedId::new([1u8; 32]),
            alias: "BTC/USD".to_string(),
        }];
        SolanaPriceListener::new(
            rpc,
            AddressFinder::default(),
            0,
            feeds,
            CommitmentConfig::confirmed(),
            Arc::new(LivenessTracker::new()),
        )
    }

    #[test]
    fn test_cache_starts_empty() {
        assert!(listener().cached_price(&FeedId::new([1u8; 32])).is_none());
    }

    #[tokio::test]
    async fn test_unreachable_rpc_reads_as_absent() {
        // Transient read failures are "unknown", never errors.
        let listener = listener();
        let snapshot = listener.get_on_chain_price_info(FeedId::new([1u8; 32])).await;
        assert!(snapshot.is_none());
    }

    #[test]
    fn test_alias_for_unconfigured_feed() {
        assert_eq!(listener().alias(&FeedId::new([9u8; 32])), "unknown");
    }
}
