use crate::{error::FetchError, hermes::AttestationSource, liveness::LivenessTracker};
use async_trait::async_trait;
use oracle_pusher_batch_tx::{
    group_into_batches, group_into_bundles, BatchOutcome, BundleSender, DirectSender,
    FeeEstimator, TxOutcome, MAX_UPDATES_PER_BUNDLED_TX, MAX_UPDATES_PER_DIRECT_TX,
};
use oracle_pusher_sdk::{
    build_update_operations, dedup_feed_ids, AddressFinder, BuildError, FeedId,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Why a push cycle stopped before submitting anything.
///
/// Aborts happen only in the fetch and build phases; once submission starts,
/// the cycle always runs to completion with per-unit outcomes.
#[derive(Error, Debug)]
pub enum CycleAbort {
    #[error("attestation fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("operation build failed: {0}")]
    Build(#[from] BuildError),
}

/// What one push cycle did: either an abort with nothing submitted, or a
/// per-unit tally. Units are transactions under the direct strategy and
/// atomic batches under the bundled one (whose landings arrive
/// asynchronously and are therefore pending when the cycle closes).
#[derive(Debug, Default)]
pub struct CycleOutcome {
    pub aborted: Option<CycleAbort>,
    pub landed: usize,
    pub failed: usize,
    pub pending: usize,
}

impl CycleOutcome {
    fn aborted(reason: CycleAbort) -> Self {
        Self {
            aborted: Some(reason),
            ..Default::default()
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }
}

/// Submission strategy seam. Exactly one implementation is constructed per
/// process, selected from configuration at startup — the choice is never
/// revisited per cycle.
#[async_trait]
pub trait PricePusher: Send + Sync {
    /// Fire one push cycle for the given feeds. Returns only once every
    /// submission unit has a terminal or logged-pending outcome; never
    /// raises, never takes the process down.
    async fn push_price_updates(
        &self,
        feed_ids: &[FeedId],
        target_publish_times: &[i64],
    ) -> CycleOutcome;
}

/// Independent per-transaction pushing.
pub struct DirectPusher {
    source: Arc<dyn AttestationSource>,
    sender: DirectSender,
    fee: FeeEstimator,
    finder: AddressFinder,
    shard_id: u16,
    liveness: Arc<LivenessTracker>,
}

impl DirectPusher {
    pub fn new(
        source: Arc<dyn AttestationSource>,
        sender: DirectSender,
        fee: FeeEstimator,
        finder: AddressFinder,
        shard_id: u16,
        liveness: Arc<LivenessTracker>,
    ) -> Self {
        Self {
            source,
            sender,
            fee,
            finder,
            shard_id,
            liveness,
        }
    }
}

#[async_trait]
impl PricePusher for DirectPusher {
    async fn push_price_updates(
        &self,
        feed_ids: &[FeedId],
        _target_publish_times: &[i64],
    ) -> CycleOutcome {
        let feed_ids = dedup_feed_ids(feed_ids);
        if feed_ids.is_empty() {
            return CycleOutcome::default();
        }

        debug!(feeds = feed_ids.len(), "fetching attestation round");
        let blob = match self.source.fetch_attestations(&feed_ids).await {
            Ok(blob) => blob,
            Err(e) => {
                error!("attestation fetch failed, cycle aborted: {e}");
                return CycleOutcome::aborted(e.into());
            }
        };

        // One fee consultation per cycle; the value below is applied
        // identically to every transaction of this cycle.
        let fee = self.fee.current();

        let operations = match build_update_operations(
            &feed_ids,
            &blob,
            &self.finder,
            &self.sender.payer_pubkey(),
            self.shard_id,
        ) {
            Ok(operations) => operations,
            Err(e) => {
                error!("operation build failed, cycle aborted: {e}");
                return CycleOutcome::aborted(e.into());
            }
        };

        let bundles = group_into_bundles(operations, MAX_UPDATES_PER_DIRECT_TX);
        debug!(
            transactions = bundles.len(),
            fee_micro_lamports = fee,
            "submitting independent transactions"
        );
        let outcomes = self.sender.submit(&bundles, fee).await;

        let landed = outcomes.iter().filter(|o| o.is_landed()).count();
        let failed = outcomes.len() - landed;
        for outcome in &outcomes {
            if let TxOutcome::Failed { error } = outcome {
                warn!("transaction failed, sibling transactions unaffected: {error}");
            }
        }

        if landed > 0 {
            self.liveness.record_push();
        }
        info!(landed, failed, "direct push cycle complete");
        CycleOutcome {
            aborted: None,
            landed,
            failed,
            pending: 0,
        }
    }
}

/// Grouped atomic pushing through the auction relay.
pub struct BundledPusher {
    source: Arc<dyn AttestationSource>,
    sender: BundleSender,
    finder: AddressFinder,
    shard_id: u16,
    liveness: Arc<LivenessTracker>,
}

impl BundledPusher {
    pub fn new(
        source: Arc<dyn AttestationSource>,
        sender: BundleSender,
        finder: AddressFinder,
        shard_id: u16,
        liveness: Arc<LivenessTracker>,
    ) -> Self {
        Self {
            source,
            sender,
            finder,
            shard_id,
            liveness,
        }
    }
}

#[async_trait]
impl PricePusher for BundledPusher {
    async fn push_price_updates(
        &self,
        feed_ids: &[FeedId],
        _target_publish_times: &[i64],
    ) -> CycleOutcome {
        let feed_ids = dedup_feed_ids(feed_ids);
        if feed_ids.is_empty() {
            return CycleOutcome::default();
        }

        debug!(feeds = feed_ids.len(), "fetching attestation round");
        let blob = match self.source.fetch_attestations(&feed_ids).await {
            Ok(blob) => blob,
            Err(e) => {
                error!("attestation fetch failed, cycle aborted: {e}");
                return CycleOutcome::aborted(e.into());
            }
        };

        let operations = match build_update_operations(
            &feed_ids,
            &blob,
            &self.finder,
            &self.sender.payer_pubkey(),
            self.shard_id,
        ) {
            Ok(operations) => operations,
            Err(e) => {
                error!("operation build failed, cycle aborted: {e}");
                return CycleOutcome::aborted(e.into());
            }
        };

        let bundles = group_into_bundles(operations, MAX_UPDATES_PER_BUNDLED_TX);
        let batches = group_into_batches(bundles, self.sender.bundle_config().max_bundle_size);

        // Batches are independent atomic units; they go out strictly in
        // order, one open relay submission at a time, each built from its
        // own explicit inputs.
        let mut pending = 0usize;
        let mut failed = 0usize;
        for batch in &batches {
            match self.sender.submit(batch).await {
                BatchOutcome::Submitted {
                    bundle_id,
                    transactions,
                } => {
                    debug!(%bundle_id, transactions, "batch submitted, outcome pending");
                    pending += 1;
                }
                BatchOutcome::Failed { error } => {
                    warn!("batch submission failed, later batches unaffected: {error}");
                    failed += 1;
                }
            }
        }

        if pending > 0 {
            self.liveness.record_push();
        }
        info!(submitted = pending, failed, "bundled push cycle complete");
        CycleOutcome {
            aborted: None,
            landed: 0,
            failed,
            pending,
        }
    }
}
