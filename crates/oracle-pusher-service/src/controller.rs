use crate::{
    config::FeedEntry, hermes::AttestationSource, listener::SolanaPriceListener,
    pusher::PricePusher,
};
use oracle_pusher_sdk::{FeedId, PriceSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// When an on-chain price counts as needing a push.
#[derive(Debug, Clone)]
pub struct PushThresholds {
    /// Push once the source publish time is this many seconds ahead
    pub time_difference_secs: i64,

    /// Push once source and on-chain price deviate by this many basis points
    pub price_deviation_bps: u64,

    /// Push once the source confidence interval reaches this share of the
    /// price, in basis points
    pub confidence_ratio_bps: u64,
}

impl Default for PushThresholds {
    fn default() -> Self {
        Self {
            time_difference_secs: 60,
            price_deviation_bps: 50,
            confidence_ratio_bps: 100,
        }
    }
}

/// Whether one feed should be pushed this tick.
///
/// An absent on-chain price is "unknown", not "stale": without a baseline to
/// compare against there is nothing to decide, so unknown feeds are skipped
/// rather than pushed blind.
pub fn needs_push(
    on_chain: Option<&PriceSnapshot>,
    source: &PriceSnapshot,
    thresholds: &PushThresholds,
) -> bool {
    let Some(on_chain) = on_chain else {
        return false;
    };

    if source.publish_time - on_chain.publish_time >= thresholds.time_difference_secs {
        return true;
    }
    if deviation_bps(source.price, on_chain.price) >= thresholds.price_deviation_bps {
        return true;
    }
    confidence_ratio_bps(source) >= thresholds.confidence_ratio_bps
}

fn deviation_bps(a: i64, b: i64) -> u64 {
    let diff = (a as i128 - b as i128).unsigned_abs();
    if diff == 0 {
        return 0;
    }
    let base = (a as i128).abs().min((b as i128).abs()).unsigned_abs();
    if base == 0 {
        return u64::MAX;
    }
    ((diff * 10_000) / base).min(u64::MAX as u128) as u64
}

fn confidence_ratio_bps(snapshot: &PriceSnapshot) -> u64 {
    if snapshot.conf == 0 {
        return 0;
    }
    let base = (snapshot.price as i128).unsigned_abs();
    if base == 0 {
        return u64::MAX;
    }
    ((snapshot.conf as u128 * 10_000) / base).min(u64::MAX as u128) as u64
}

/// Drives the pipeline: an on-chain poll loop and a push loop, each on its
/// own fixed frequency.
///
/// The push loop is the only caller of the pusher and awaits each cycle to
/// completion before its next tick, so at most one cycle is ever active —
/// mutual exclusion by structure, no locking.
pub struct Controller {
    feeds: Vec<FeedEntry>,
    source: Arc<dyn AttestationSource>,
    listener: Arc<SolanaPriceListener>,
    pusher: Arc<dyn PricePusher>,
    thresholds: PushThresholds,
    pushing_frequency: Duration,
    polling_frequency: Duration,
}

impl Controller {
    pub fn new(
        feeds: Vec<FeedEntry>,
        source: Arc<dyn AttestationSource>,
        listener: Arc<SolanaPriceListener>,
        pusher: Arc<dyn PricePusher>,
        thresholds: PushThresholds,
        pushing_frequency: Duration,
        polling_frequency: Duration,
    ) -> Self {
        Self {
            feeds,
            source,
            listener,
            pusher,
            thresholds,
            pushing_frequency,
            polling_frequency,
        }
    }

    /// Run both loops until the process is terminated.
    pub async fn run(self) {
        let listener = Arc::clone(&self.listener);
        let polling_frequency = self.polling_frequency;
        let poll_loop = async move {
            let mut ticker = tokio::time::interval(polling_frequency);
            loop {
                ticker.tick().await;
                listener.poll_once().await;
            }
        };

        let push_loop = async {
            let mut ticker = tokio::time::interval(self.pushing_frequency);
            loop {
                ticker.tick().await;
                self.push_tick().await;
            }
        };

        tokio::join!(poll_loop, push_loop);
    }

    /// One scheduler tick: ask the source for its latest prices, select the
    /// feeds that need pushing, and fire a cycle for them. Every failure is
    /// absorbed here; the next tick starts clean.
    async fn push_tick(&self) {
        let feed_ids: Vec<FeedId> = self.feeds.iter().map(|feed| feed.id).collect();

        let source_prices = match self.source.fetch_latest_prices(&feed_ids).await {
            Ok(prices) => prices,
            Err(e) => {
                warn!("source price fetch failed, skipping this push tick: {e}");
                return;
            }
        };

        let mut selected = Vec::new();
        let mut publish_times = Vec::new();
        for feed in &self.feeds {
            let Some(source_price) = source_prices.get(&feed.id) else {
                debug!(feed = feed.alias.as_str(), "source has no price, skipping");
                continue;
            };
            let on_chain = self.listener.cached_price(&feed.id);
            if needs_push(on_chain.as_ref(), source_price, &self.thresholds) {
                debug!(feed = feed.alias.as_str(), "selected for push");
                selected.push(feed.id);
                publish_times.push(source_price.publish_time);
            }
        }

        if selected.is_empty() {
            debug!("no feeds need pushing this tick");
            return;
        }

        info!(feeds = selected.len(), "starting push cycle");
        let outcome = self
            .pusher
            .push_price_updates(&selected, &publish_times)
            .await;

        if let Some(reason) = &outcome.aborted {
            warn!("push cycle aborted: {reason}");
        } else {
            info!(
                landed = outcome.landed,
                failed = outcome.failed,
                pending = outcome.pending,
                "push cycle complete"
            );
        }
    }
}
