/*!
# Oracle Pusher Batch Transaction Layer

Capacity-bounded batching and the two submission strategies for pushing price
updates: independent per-transaction dispatch ("direct") and grouped atomic
auction dispatch with a paid tip ("bundled"). Based on the send patterns of
the Solana CLI for production reliability.

## Quick Start

```rust,no_run
use oracle_pusher_batch_tx::{
    group_into_bundles, DirectSender, SubmitConfig, MAX_UPDATES_PER_DIRECT_TX,
};
use oracle_pusher_sdk::UpdateOperation;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::signature::Keypair;
use std::sync::Arc;

# async fn example(operations: Vec<UpdateOperation>) {
let rpc_client = Arc::new(RpcClient::new("https://api.devnet.solana.com".to_string()));
let payer = Keypair::new();
let sender = DirectSender::new(rpc_client, payer, SubmitConfig::default());

// Chunk under the per-transaction capacity, then dispatch each transaction
// independently; one failure never blocks the others.
let bundles = group_into_bundles(operations, MAX_UPDATES_PER_DIRECT_TX);
let outcomes = sender.submit(&bundles, 50_000).await;
println!("{} transactions landed", outcomes.iter().filter(|o| o.is_landed()).count());
# }
```

## Strategy Contracts

- **Direct**: every transaction is an independent unit with its own bounded
  rebroadcast loop and confirmation polling; no atomicity is claimed across
  transactions.
- **Bundled**: a [`SubmissionBatch`] is handed to an external relay as one
  all-or-nothing auction unit carrying a tip; atomicity within the batch is
  the relay's contract, and batches are independent of each other.
*/

mod bundle;
mod chunk;
mod config;
mod direct;
mod error;
mod fee;
mod relay;
mod transaction;

pub use bundle::{build_batch_transactions, BatchOutcome, BundleSender};
pub use chunk::{group_into_batches, group_into_bundles, SubmissionBatch, TransactionBundle};
pub use config::{
    BundleConfig, SubmitConfig, MAX_UPDATES_PER_BUNDLED_TX, MAX_UPDATES_PER_DIRECT_TX,
};
pub use direct::{DirectSender, TxOutcome};
pub use error::{RelayError, SubmitError, SubmitResult};
pub use fee::{FeeConfig, FeeEstimator};
pub use relay::{BundleId, BundleRelay, BundleState, BundleStatus, JsonRpcRelay};
pub use transaction::build_bundle_transaction;
