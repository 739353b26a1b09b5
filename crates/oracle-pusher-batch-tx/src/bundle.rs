use crate::{
    chunk::SubmissionBatch,
    config::{BundleConfig, SubmitConfig},
    error::SubmitError,
    relay::{BundleId, BundleRelay, BundleState},
    transaction::build_bundle_transaction,
    SubmitResult,
};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    address_lookup_table::AddressLookupTableAccount, hash::Hash, pubkey::Pubkey,
    signature::Keypair, signer::Signer, transaction::VersionedTransaction,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of submitting one atomic batch to the relay.
///
/// `Submitted` means the relay accepted the submission; whether the batch
/// actually lands arrives later through the status stream and is logged by
/// the watcher, so a submitted batch counts as pending when the cycle closes.
#[derive(Debug)]
pub enum BatchOutcome {
    Submitted {
        bundle_id: BundleId,
        transactions: usize,
    },
    Failed {
        error: SubmitError,
    },
}

impl BatchOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, BatchOutcome::Submitted { .. })
    }
}

/// Build one signed transaction per bundle in the batch, the tip transfer
/// attached to the last one so the relay can verify payment after the
/// updates.
///
/// All-or-nothing applies to building too: a batch that cannot be fully
/// built yields no transactions at all.
pub fn build_batch_transactions(
    batch: &SubmissionBatch,
    payer: &Keypair,
    config: &SubmitConfig,
    tip_account: Pubkey,
    tip_lamports: u64,
    lookup_tables: &[AddressLookupTableAccount],
    recent_blockhash: Hash,
) -> SubmitResult<Vec<VersionedTransaction>> {
    let last = batch.bundles.len().saturating_sub(1);
    let mut transactions = Vec::with_capacity(batch.bundles.len());

    for (index, bundle) in batch.bundles.iter().enumerate() {
        let tip = (index == last).then_some((tip_account, tip_lamports));
        let transaction = build_bundle_transaction(
            bundle,
            payer,
            config.compute_unit_limit,
            None,
            tip,
            lookup_tables,
            recent_blockhash,
        )?;
        transactions.push(transaction);
    }

    Ok(transactions)
}

/// Grouped atomic dispatch through an external auction relay.
///
/// One batch at a time: the caller processes batches strictly sequentially,
/// and each batch gets its own blockhash, transactions, and tip transfer
/// built from explicit per-batch inputs. The relay guarantees all-or-nothing
/// inclusion within a batch; nothing is guaranteed across batches.
pub struct BundleSender {
    rpc: Arc<RpcClient>,
    relay: Arc<dyn BundleRelay>,
    payer: Keypair,
    lookup_tables: Vec<AddressLookupTableAccount>,
    config: SubmitConfig,
    bundle_config: BundleConfig,
}

impl BundleSender {
    pub fn new(
        rpc: Arc<RpcClient>,
        relay: Arc<dyn BundleRelay>,
        payer: Keypair,
        config: SubmitConfig,
        bundle_config: BundleConfig,
    ) -> Self {
        Self {
            rpc,
            relay,
            payer,
            lookup_tables: Vec::new(),
            config,
            bundle_config,
        }
    }

    pub fn with_lookup_tables(mut self, lookup_tables: Vec<AddressLookupTableAccount>) -> Self {
        self.lookup_tables = lookup_tables;
        self
    }

    pub fn payer_pubkey(&self) -> Pubkey {
        self.payer.pubkey()
    }

    pub fn bundle_config(&self) -> &BundleConfig {
        &self.bundle_config
    }

    /// Build and submit one batch as a single atomic auction unit.
    pub async fn submit(&self, batch: &SubmissionBatch) -> BatchOutcome {
        if batch.bundles.is_empty() {
            return BatchOutcome::Failed {
                error: SubmitError::Compile("empty submission batch".to_string()),
            };
        }

        let recent_blockhash = match self.rpc.get_latest_blockhash().await {
            Ok(hash) => hash,
            Err(e) => {
                return BatchOutcome::Failed {
                    error: SubmitError::BlockhashUnavailable(e.to_string()),
                }
            }
        };

        let transactions = match build_batch_transactions(
            batch,
            &self.payer,
            &self.config,
            self.relay.tip_account(),
            self.bundle_config.tip_lamports,
            &self.lookup_tables,
            recent_blockhash,
        ) {
            Ok(transactions) => transactions,
            Err(error) => return BatchOutcome::Failed { error },
        };

        match self.relay.send_bundle(&transactions).await {
            Ok(bundle_id) => {
                info!(
                    %bundle_id,
                    transactions = transactions.len(),
                    tip_lamports = self.bundle_config.tip_lamports,
                    "bundle submitted"
                );
                self.spawn_status_watcher(bundle_id.clone(), transactions);
                BatchOutcome::Submitted {
                    bundle_id,
                    transactions: batch.bundles.len(),
                }
            }
            Err(error) => BatchOutcome::Failed {
                error: error.into(),
            },
        }
    }

    /// Watch for the relay's asynchronous accept/reject notification.
    ///
    /// Rejections are logged and, unless `retry_rejected` is set, left for
    /// the next scheduled cycle to pick up — the underlying feeds are still
    /// stale, so the next cycle re-requests them anyway.
    fn spawn_status_watcher(&self, bundle_id: BundleId, transactions: Vec<VersionedTransaction>) {
        let relay = Arc::clone(&self.relay);
        let poll_interval = self.bundle_config.status_poll_interval;
        let poll_attempts = self.bundle_config.status_poll_attempts;
        let retry_rejected = self.bundle_config.retry_rejected;

        tokio::spawn(async move {
            for _ in 0..poll_attempts {
                tokio::time::sleep(poll_interval).await;

                let statuses = match relay.bundle_statuses(std::slice::from_ref(&bundle_id)).await
                {
                    Ok(statuses) => statuses,
                    Err(e) => {
                        debug!(%bundle_id, "bundle status query failed: {e}");
                        continue;
                    }
                };

                match statuses.first().map(|s| &s.state) {
                    Some(BundleState::Landed { slot }) => {
                        info!(%bundle_id, slot, "bundle landed");
                        return;
                    }
                    Some(BundleState::Rejected { reason }) => {
                        warn!(%bundle_id, %reason, "bundle rejected");
                        if retry_rejected {
                            match relay.send_bundle(&transactions).await {
                                Ok(resubmitted) => {
                                    info!(%bundle_id, %resubmitted, "rejected bundle resubmitted")
                                }
                                Err(e) => warn!(%bundle_id, "bundle resubmission failed: {e}"),
                            }
                        }
                        return;
                    }
                    Some(BundleState::Pending) | None => {}
                }
            }
            warn!(%bundle_id, "bundle outcome unknown after polling window");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayError;
    use crate::relay::BundleStatus;
    use crate::{group_into_batches, group_into_bundles, MAX_UPDATES_PER_BUNDLED_TX};
    use async_trait::async_trait;
    use oracle_pusher_sdk::{build_update_operations, AddressFinder, AttestationBlob, FeedId};
    use std::sync::Mutex;

    /// Relay double enforcing the auction contract: a submission is either
    /// accepted with all of its transactions recorded, or rejected with none
    /// of them recorded. There is no partial acceptance path at all.
    #[derive(Default)]
    struct SimulatedRelay {
        reject: bool,
        accepted: Mutex<Vec<usize>>,
        submissions: Mutex<usize>,
    }

    #[async_trait]
    impl BundleRelay for SimulatedRelay {
        async fn send_bundle(
            &self,
            transactions: &[VersionedTransaction],
        ) -> Result<BundleId, RelayError> {
            *self.submissions.lock().unwrap() += 1;
            if self.reject {
                return Err(RelayError::Rpc {
                    code: -32000,
                    message: "bundle rejected at auction".to_string(),
                });
            }
            let mut accepted = self.accepted.lock().unwrap();
            accepted.push(transactions.len());
            Ok(BundleId(format!("bundle-{}", accepted.len())))
        }

        async fn bundle_statuses(
            &self,
            ids: &[BundleId],
        ) -> Result<Vec<BundleStatus>, RelayError> {
            Ok(ids
                .iter()
                .map(|id| BundleStatus {
                    bundle_id: id.clone(),
                    state: BundleState::Landed { slot: 1 },
                })
                .collect())
        }

        fn tip_account(&self) -> Pubkey {
            Pubkey::new_unique()
        }
    }

    fn batches_for(feed_count: u8, payer: &Pubkey) -> Vec<SubmissionBatch> {
        let feed_ids: Vec<FeedId> = (1..=feed_count).map(|i| FeedId::new([i; 32])).collect();
        let blob = AttestationBlob::from_segments(
            feed_ids.iter().map(|id| (*id, vec![0xab; 8])).collect(),
        );
        let ops =
            build_update_operations(&feed_ids, &blob, &AddressFinder::default(), payer, 0).unwrap();
        group_into_batches(group_into_bundles(ops, MAX_UPDATES_PER_BUNDLED_TX), 2)
    }

    #[test]
    fn test_tip_rides_only_the_last_transaction() {
        let payer = Keypair::new();
        let tip_account = Pubkey::new_unique();

        // 8 feeds at capacity 7 -> one batch of two transactions
        let batches = batches_for(8, &payer.pubkey());
        assert_eq!(batches.len(), 1);

        let transactions = build_batch_transactions(
            &batches[0],
            &payer,
            &SubmitConfig::default(),
            tip_account,
            10_000,
            &[],
            Hash::default(),
        )
        .unwrap();

        assert_eq!(transactions.len(), 2);
        // first transaction: unit limit + 7 updates, no tip
        assert_eq!(transactions[0].message.instructions().len(), 8);
        // last transaction: unit limit + 1 update + tip transfer
        assert_eq!(transactions[1].message.instructions().len(), 3);
        assert!(transactions[1]
            .message
            .static_account_keys()
            .contains(&tip_account));
        assert!(!transactions[0]
            .message
            .static_account_keys()
            .contains(&tip_account));
    }

    #[tokio::test]
    async fn test_simulated_relay_accepts_all_transactions_or_none() {
        let payer = Keypair::new();
        let batches = batches_for(8, &payer.pubkey());

        let accepting = SimulatedRelay::default();
        let transactions = build_batch_transactions(
            &batches[0],
            &payer,
            &SubmitConfig::default(),
            accepting.tip_account(),
            10_000,
            &[],
            Hash::default(),
        )
        .unwrap();

        accepting.send_bundle(&transactions).await.unwrap();
        assert_eq!(*accepting.accepted.lock().unwrap(), vec![2]);

        let rejecting = SimulatedRelay {
            reject: true,
            ..Default::default()
        };
        let result = rejecting.send_bundle(&transactions).await;
        assert!(result.is_err());
        assert!(rejecting.accepted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_is_refused_without_relay_contact() {
        let relay = Arc::new(SimulatedRelay::default());
        let rpc = Arc::new(RpcClient::new("http://127.0.0.1:1".to_string()));
        let sender = BundleSender::new(
            rpc,
            Arc::clone(&relay) as Arc<dyn BundleRelay>,
            Keypair::new(),
            SubmitConfig::default(),
            BundleConfig::default(),
        );

        let outcome = sender.submit(&SubmissionBatch { bundles: vec![] }).await;

        assert!(!outcome.is_submitted());
        assert_eq!(*relay.submissions.lock().unwrap(), 0);
    }

    #[test]
    fn test_unbuildable_batch_yields_no_transactions() {
        let payer = Keypair::new();
        let feed_ids: Vec<FeedId> = (1..=4).map(|i| FeedId::new([i; 32])).collect();
        let blob = AttestationBlob::from_segments(
            feed_ids.iter().map(|id| (*id, vec![0xab; 600])).collect(),
        );
        let ops = build_update_operations(
            &feed_ids,
            &blob,
            &AddressFinder::default(),
            &payer.pubkey(),
            0,
        )
        .unwrap();
        let batches = group_into_batches(group_into_bundles(ops, MAX_UPDATES_PER_BUNDLED_TX), 2);

        let result = build_batch_transactions(
            &batches[0],
            &payer,
            &SubmitConfig::default(),
            Pubkey::new_unique(),
            10_000,
            &[],
            Hash::default(),
        );

        assert!(matches!(
            result,
            Err(SubmitError::TransactionTooLarge { .. })
        ));
    }
}
