use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Bounds applied to every fee read
#[derive(Debug, Clone)]
pub struct FeeConfig {
    /// How often the subscribed estimator resamples recent fees
    pub refresh_interval: Duration,

    /// Multiplier over the raw running estimate
    pub fee_multiplier: f64,

    /// Hard ceiling in micro-lamports per compute unit
    pub max_fee_micro_lamports: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(5),
            fee_multiplier: 1.25,
            max_fee_micro_lamports: 30_000_000,
        }
    }
}

/// Priority-fee source for the direct strategy, fixed at construction.
///
/// Either a static operator-configured value or a running estimate sampled
/// from the network in the background. Consulted exactly once per push
/// cycle; the value is applied identically to every transaction of that
/// cycle and never exceeds the configured ceiling.
pub struct FeeEstimator {
    mode: Mode,
    config: FeeConfig,
}

enum Mode {
    Fixed(u64),
    Subscribed {
        current: Arc<AtomicU64>,
        handle: JoinHandle<()>,
    },
}

impl FeeEstimator {
    /// Static fee from configuration, still clamped to the ceiling.
    pub fn fixed(micro_lamports: u64, config: FeeConfig) -> Self {
        Self {
            mode: Mode::Fixed(micro_lamports),
            config,
        }
    }

    /// Running estimate: a background task samples recent prioritization
    /// fees paid on the watched accounts and averages them over the returned
    /// slots.
    pub fn subscribed(rpc: Arc<RpcClient>, watched: Vec<Pubkey>, config: FeeConfig) -> Self {
        let current = Arc::new(AtomicU64::new(0));
        let sampled = Arc::clone(&current);
        let refresh_interval = config.refresh_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(refresh_interval);
            loop {
                ticker.tick().await;
                match rpc.get_recent_prioritization_fees(&watched).await {
                    Ok(fees) if !fees.is_empty() => {
                        let sum: u64 = fees.iter().map(|f| f.prioritization_fee).sum();
                        let average = sum / fees.len() as u64;
                        sampled.store(average, Ordering::Relaxed);
                        debug!(average, slots = fees.len(), "prioritization fee sampled");
                    }
                    Ok(_) => {}
                    Err(e) => warn!("prioritization fee sample failed: {e}"),
                }
            }
        });

        Self {
            mode: Mode::Subscribed { current, handle },
            config,
        }
    }

    /// The fee value for the current cycle, in micro-lamports per compute
    /// unit.
    pub fn current(&self) -> u64 {
        match &self.mode {
            Mode::Fixed(value) => (*value).min(self.config.max_fee_micro_lamports),
            Mode::Subscribed { current, .. } => {
                apply_bounds(current.load(Ordering::Relaxed), &self.config)
            }
        }
    }
}

impl Drop for FeeEstimator {
    fn drop(&mut self) {
        if let Mode::Subscribed { handle, .. } = &self.mode {
            handle.abort();
        }
    }
}

fn apply_bounds(raw: u64, config: &FeeConfig) -> u64 {
    let multiplied = (raw as f64 * config.fee_multiplier).round() as u64;
    multiplied.min(config.max_fee_micro_lamports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplier_applies_to_raw_estimate() {
        let config = FeeConfig::default();
        assert_eq!(apply_bounds(40_000, &config), 50_000);
        assert_eq!(apply_bounds(0, &config), 0);
    }

    #[test]
    fn test_ceiling_clamps_multiplied_estimate() {
        let config = FeeConfig {
            max_fee_micro_lamports: 100_000,
            ..Default::default()
        };
        assert_eq!(apply_bounds(1_000_000, &config), 100_000);
    }

    #[test]
    fn test_fixed_value_never_exceeds_ceiling() {
        let config = FeeConfig {
            max_fee_micro_lamports: 60_000,
            ..Default::default()
        };

        let modest = FeeEstimator::fixed(50_000, config.clone());
        assert_eq!(modest.current(), 50_000);

        let excessive = FeeEstimator::fixed(90_000, config);
        assert_eq!(excessive.current(), 60_000);
    }

    #[test]
    fn test_fixed_reads_are_stable_within_a_cycle() {
        let estimator = FeeEstimator::fixed(42_000, FeeConfig::default());
        let first = estimator.current();
        let second = estimator.current();
        assert_eq!(first, second);
    }
}
