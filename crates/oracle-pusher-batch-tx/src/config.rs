use backoff::ExponentialBackoff;
use solana_sdk::commitment_config::CommitmentConfig;
use std::time::Duration;

/// Update operations per transaction under the bundled strategy. Kept small
/// so a full batch of transactions stays inside the relay's bundle size
/// limits.
pub const MAX_UPDATES_PER_BUNDLED_TX: usize = 7;

/// Update operations per transaction under the direct strategy. A full
/// update instruction plus compute-budget overhead must fit the 1232-byte
/// packet, which caps how many operations one transaction can carry.
pub const MAX_UPDATES_PER_DIRECT_TX: usize = 11;

/// Configuration shared by both submission strategies
#[derive(Debug, Clone)]
pub struct SubmitConfig {
    /// Maximum broadcast attempts per transaction before giving up on it
    pub max_rebroadcasts: usize,

    /// Backoff between rebroadcast attempts
    pub retry_backoff: ExponentialBackoff,

    /// Wait between a broadcast and its confirmation check
    pub confirm_poll_interval: Duration,

    /// Commitment level at which a transaction counts as committed
    pub confirmation_commitment: CommitmentConfig,

    /// Whether to skip preflight simulation when broadcasting
    pub skip_preflight: bool,

    /// Compute unit limit set on every built transaction
    pub compute_unit_limit: u32,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            max_rebroadcasts: 5,
            retry_backoff: ExponentialBackoff {
                initial_interval: Duration::from_millis(250),
                max_interval: Duration::from_secs(2),
                max_elapsed_time: None,
                multiplier: 2.0,
                ..Default::default()
            },
            confirm_poll_interval: Duration::from_millis(400),
            confirmation_commitment: CommitmentConfig::confirmed(),
            skip_preflight: true,
            compute_unit_limit: 300_000,
        }
    }
}

/// Configuration specific to the bundled strategy
#[derive(Debug, Clone)]
pub struct BundleConfig {
    /// Lamports paid to the relay's tip account per submitted batch
    pub tip_lamports: u64,

    /// Maximum transactions per atomic batch, per the relay's limit
    pub max_bundle_size: usize,

    /// Resubmit a rejected batch once instead of waiting for the next
    /// scheduled cycle
    pub retry_rejected: bool,

    /// Interval between bundle status polls
    pub status_poll_interval: Duration,

    /// Status polls before giving up on observing an outcome
    pub status_poll_attempts: usize,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            tip_lamports: 10_000,
            max_bundle_size: 2,
            retry_rejected: false,
            status_poll_interval: Duration::from_secs(2),
            status_poll_attempts: 15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_submit_config() {
        let config = SubmitConfig::default();
        assert_eq!(config.max_rebroadcasts, 5);
        assert!(config.skip_preflight);
        assert_eq!(
            config.confirmation_commitment,
            CommitmentConfig::confirmed()
        );
    }

    #[test]
    fn test_default_bundle_config_waits_for_next_cycle() {
        let config = BundleConfig::default();
        assert!(!config.retry_rejected);
        assert_eq!(config.max_bundle_size, 2);
    }
}
