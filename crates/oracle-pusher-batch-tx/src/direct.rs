use crate::{
    chunk::TransactionBundle, config::SubmitConfig, error::SubmitError,
    transaction::build_bundle_transaction, SubmitResult,
};
use backoff::backoff::Backoff;
use futures::future::join_all;
use solana_client::{
    nonblocking::rpc_client::RpcClient, rpc_config::RpcSendTransactionConfig,
};
use solana_sdk::{
    address_lookup_table::AddressLookupTableAccount,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::VersionedTransaction,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Terminal outcome of one independently dispatched transaction
#[derive(Debug)]
pub enum TxOutcome {
    Landed {
        signature: Signature,
        broadcasts: usize,
    },
    Failed {
        error: SubmitError,
    },
}

impl TxOutcome {
    pub fn is_landed(&self) -> bool {
        matches!(self, TxOutcome::Landed { .. })
    }
}

/// Independent per-transaction dispatch.
///
/// Every transaction in a cycle is broadcast concurrently, to the primary
/// endpoint and any additional redundant send endpoints, and rebroadcast with
/// confirmation polling up to a bounded attempt count. Transactions share the
/// cycle's single fee value but nothing else: one unit's failure never
/// affects another's dispatch or outcome, and no rollback exists or is
/// needed.
pub struct DirectSender {
    rpc: Arc<RpcClient>,
    send_rpcs: Vec<Arc<RpcClient>>,
    payer: Keypair,
    lookup_tables: Vec<AddressLookupTableAccount>,
    config: SubmitConfig,
}

impl DirectSender {
    pub fn new(rpc: Arc<RpcClient>, payer: Keypair, config: SubmitConfig) -> Self {
        Self {
            rpc,
            send_rpcs: Vec::new(),
            payer,
            lookup_tables: Vec::new(),
            config,
        }
    }

    /// Redundant send endpoints to improve landing probability. Confirmation
    /// is still observed through the primary endpoint only.
    pub fn with_additional_endpoints(mut self, endpoints: Vec<Arc<RpcClient>>) -> Self {
        self.send_rpcs = endpoints;
        self
    }

    pub fn with_lookup_tables(mut self, lookup_tables: Vec<AddressLookupTableAccount>) -> Self {
        self.lookup_tables = lookup_tables;
        self
    }

    pub fn payer_pubkey(&self) -> Pubkey {
        self.payer.pubkey()
    }

    /// Dispatch one transaction per bundle, concurrently, and return one
    /// outcome per bundle in input order.
    pub async fn submit(
        &self,
        bundles: &[TransactionBundle],
        compute_unit_price: u64,
    ) -> Vec<TxOutcome> {
        if bundles.is_empty() {
            return Vec::new();
        }

        let recent_blockhash = match self.rpc.get_latest_blockhash().await {
            Ok(hash) => hash,
            Err(e) => {
                warn!("no recent blockhash, failing the whole cycle's transactions: {e}");
                return bundles
                    .iter()
                    .map(|_| TxOutcome::Failed {
                        error: SubmitError::BlockhashUnavailable(e.to_string()),
                    })
                    .collect();
            }
        };

        self.submit_with_blockhash(bundles, compute_unit_price, recent_blockhash)
            .await
    }

    /// Like [`submit`](Self::submit), with the cycle's blockhash supplied by
    /// the caller.
    pub async fn submit_with_blockhash(
        &self,
        bundles: &[TransactionBundle],
        compute_unit_price: u64,
        recent_blockhash: solana_sdk::hash::Hash,
    ) -> Vec<TxOutcome> {
        let dispatches = bundles.iter().enumerate().map(|(index, bundle)| async move {
            let transaction = match build_bundle_transaction(
                bundle,
                &self.payer,
                self.config.compute_unit_limit,
                Some(compute_unit_price),
                None,
                &self.lookup_tables,
                recent_blockhash,
            ) {
                Ok(tx) => tx,
                Err(error) => return TxOutcome::Failed { error },
            };

            match self.send_until_confirmed(transaction, index).await {
                Ok((signature, broadcasts)) => TxOutcome::Landed {
                    signature,
                    broadcasts,
                },
                Err(error) => TxOutcome::Failed { error },
            }
        });

        let outcomes = join_all(dispatches).await;

        info!(
            landed = outcomes.iter().filter(|o| o.is_landed()).count(),
            failed = outcomes.iter().filter(|o| !o.is_landed()).count(),
            "direct submission complete"
        );
        outcomes
    }

    /// Broadcast-and-confirm loop for one transaction. Send errors on
    /// individual endpoints only lower the landing odds for this attempt;
    /// the unit fails only once the attempt budget is exhausted.
    async fn send_until_confirmed(
        &self,
        transaction: VersionedTransaction,
        index: usize,
    ) -> SubmitResult<(Signature, usize)> {
        let signature = *transaction
            .signatures
            .first()
            .ok_or_else(|| SubmitError::Signing("unsigned transaction".to_string()))?;

        let send_config = RpcSendTransactionConfig {
            skip_preflight: self.config.skip_preflight,
            max_retries: Some(0),
            ..Default::default()
        };

        let mut pacing = self.config.retry_backoff.clone();
        for attempt in 1..=self.config.max_rebroadcasts {
            for rpc in std::iter::once(&self.rpc).chain(self.send_rpcs.iter()) {
                if let Err(e) = rpc
                    .send_transaction_with_config(&transaction, send_config.clone())
                    .await
                {
                    debug!(%signature, index, attempt, "broadcast failed: {e}");
                }
            }

            tokio::time::sleep(self.config.confirm_poll_interval).await;

            match self
                .rpc
                .confirm_transaction_with_commitment(
                    &signature,
                    self.config.confirmation_commitment,
                )
                .await
            {
                Ok(response) if response.value => {
                    debug!(%signature, index, attempt, "transaction confirmed");
                    return Ok((signature, attempt));
                }
                Ok(_) => {}
                Err(e) => warn!(%signature, index, "confirmation query failed: {e}"),
            }

            if attempt < self.config.max_rebroadcasts {
                if let Some(delay) = pacing.next_backoff() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(SubmitError::ConfirmationTimeout {
            signature,
            attempts: self.config.max_rebroadcasts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group_into_bundles;
    use oracle_pusher_sdk::{build_update_operations, AddressFinder, AttestationBlob, FeedId};
    use solana_sdk::hash::Hash;
    use std::time::Duration;

    fn bundles_with_payloads(payload_sizes: &[usize], payer: &Pubkey) -> Vec<TransactionBundle> {
        let feed_ids: Vec<FeedId> = (1..=payload_sizes.len() as u8)
            .map(|i| FeedId::new([i; 32]))
            .collect();
        let blob = AttestationBlob::from_segments(
            feed_ids
                .iter()
                .zip(payload_sizes)
                .map(|(id, size)| (*id, vec![0xab; *size]))
                .collect(),
        );
        let ops =
            build_update_operations(&feed_ids, &blob, &AddressFinder::default(), payer, 0).unwrap();
        // one operation per bundle so each gets its own transaction
        group_into_bundles(ops, 1)
    }

    fn fast_failing_sender() -> DirectSender {
        let config = SubmitConfig {
            max_rebroadcasts: 1,
            confirm_poll_interval: Duration::ZERO,
            ..Default::default()
        };
        let rpc = Arc::new(RpcClient::new("http://127.0.0.1:1".to_string()));
        DirectSender::new(rpc, Keypair::new(), config)
    }

    #[tokio::test]
    async fn test_one_units_failure_never_blocks_its_siblings() {
        let sender = fast_failing_sender();
        let payer = sender.payer_pubkey();

        // The middle unit is forced to fail before dispatch (oversized); its
        // siblings must still be dispatched and report their own outcomes.
        let bundles = bundles_with_payloads(&[8, 4_000, 8], &payer);

        let outcomes = sender
            .submit_with_blockhash(&bundles, 50_000, Hash::default())
            .await;

        assert_eq!(outcomes.len(), 3);
        assert!(matches!(
            outcomes[1],
            TxOutcome::Failed {
                error: SubmitError::TransactionTooLarge { .. }
            }
        ));
        // Siblings got all the way through their bounded broadcast loop
        // against the unroutable endpoint.
        for outcome in [&outcomes[0], &outcomes[2]] {
            assert!(matches!(
                outcome,
                TxOutcome::Failed {
                    error: SubmitError::ConfirmationTimeout { attempts: 1, .. }
                }
            ));
        }
    }

    #[tokio::test]
    async fn test_empty_input_issues_no_rpc_calls() {
        // An unroutable endpoint: any network call would error loudly, and
        // the expected empty result proves none was attempted.
        let rpc = Arc::new(RpcClient::new("http://127.0.0.1:1".to_string()));
        let sender = DirectSender::new(rpc, Keypair::new(), SubmitConfig::default());

        let outcomes = sender.submit(&[], 50_000).await;
        assert!(outcomes.is_empty());
    }

    #[test]
    fn test_payer_pubkey_is_stable() {
        let rpc = Arc::new(RpcClient::new("http://127.0.0.1:1".to_string()));
        let payer = Keypair::new();
        let expected = payer.pubkey();
        let sender = DirectSender::new(rpc, payer, SubmitConfig::default());

        assert_eq!(sender.payer_pubkey(), expected);
    }
}
