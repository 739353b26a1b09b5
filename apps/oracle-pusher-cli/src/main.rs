use anyhow::{anyhow, Context, Result};
use clap::Parser;
use oracle_pusher_batch_tx::{
    BundleConfig, BundleSender, DirectSender, FeeConfig, FeeEstimator, JsonRpcRelay, SubmitConfig,
};
use oracle_pusher_sdk::AddressFinder;
use oracle_pusher_service::{
    load_feed_config, AttestationSource, BundledPusher, Controller, DirectPusher, HermesClient,
    LivenessTracker, PricePusher, PushThresholds, SolanaPriceListener,
};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    address_lookup_table::{state::AddressLookupTable, AddressLookupTableAccount},
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::read_keypair_file,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "oracle-pusher")]
#[command(about = "Push attested price updates to on-chain feed accounts")]
#[command(version)]
struct Cli {
    /// Solana RPC endpoint
    #[arg(long)]
    endpoint: String,

    /// Additional send-only endpoints, comma separated (direct strategy)
    #[arg(long)]
    additional_send_endpoints: Option<String>,

    /// Path to the payer keypair file
    #[arg(long)]
    keypair_file: PathBuf,

    /// Path to the YAML feed list (entries of id + alias)
    #[arg(long)]
    feed_config: PathBuf,

    /// Attestation service endpoint
    #[arg(long)]
    attestation_endpoint: String,

    /// Receiver program that owns the feed accounts
    #[arg(long)]
    receiver_program: Option<Pubkey>,

    /// Shard of each feed's on-chain storage to write
    #[arg(long, default_value = "0")]
    shard_id: u16,

    /// Address lookup table, fetched once at startup
    #[arg(long)]
    address_lookup_table: Option<Pubkey>,

    /// Static priority fee per compute unit; omit to subscribe to a running
    /// estimate sampled from the network
    #[arg(long)]
    compute_unit_price_micro_lamports: Option<u64>,

    /// Priority fee ceiling in micro-lamports per compute unit
    #[arg(long, default_value = "30000000")]
    max_fee_micro_lamports: u64,

    /// Multiplier over the raw priority fee estimate
    #[arg(long, default_value = "1.25")]
    fee_multiplier: f64,

    /// Relay endpoint for bundled submission
    #[arg(long)]
    relay_endpoint: Option<String>,

    /// Relay tip account paid by every bundle
    #[arg(long)]
    tip_account: Option<Pubkey>,

    /// Lamports tipped per bundle; setting this selects the bundled strategy
    #[arg(long)]
    tip_lamports: Option<u64>,

    /// Transactions per bundle under the bundled strategy
    #[arg(long, default_value = "2")]
    bundle_size: usize,

    /// Seconds between push cycles
    #[arg(long, default_value = "10")]
    pushing_frequency_secs: u64,

    /// Seconds between on-chain polls
    #[arg(long, default_value = "5")]
    polling_frequency_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let feeds = load_feed_config(&cli.feed_config)
        .with_context(|| format!("loading feed config from {}", cli.feed_config.display()))?;
    let payer = read_keypair_file(&cli.keypair_file)
        .map_err(|e| anyhow!("reading keypair from {}: {e}", cli.keypair_file.display()))?;

    let rpc = Arc::new(RpcClient::new_with_commitment(
        cli.endpoint.clone(),
        CommitmentConfig::confirmed(),
    ));

    let finder = cli
        .receiver_program
        .map(AddressFinder::new)
        .unwrap_or_default();

    let lookup_tables = match cli.address_lookup_table {
        Some(key) => vec![fetch_lookup_table(&rpc, key).await?],
        None => Vec::new(),
    };

    let liveness = Arc::new(LivenessTracker::new());
    let source: Arc<dyn AttestationSource> =
        Arc::new(HermesClient::new(cli.attestation_endpoint.clone()));
    let listener = Arc::new(SolanaPriceListener::new(
        Arc::clone(&rpc),
        finder.clone(),
        cli.shard_id,
        feeds.clone(),
        CommitmentConfig::confirmed(),
        Arc::clone(&liveness),
    ));

    // Tip configured means bundled submission; otherwise direct. Decided
    // exactly once, here.
    let pusher: Arc<dyn PricePusher> = if let Some(tip_lamports) = cli.tip_lamports {
        let relay_endpoint = cli
            .relay_endpoint
            .context("--relay-endpoint is required with --tip-lamports")?;
        let tip_account = cli
            .tip_account
            .context("--tip-account is required with --tip-lamports")?;

        let relay = Arc::new(JsonRpcRelay::new(relay_endpoint, tip_account));
        let bundle_config = BundleConfig {
            tip_lamports,
            max_bundle_size: cli.bundle_size,
            ..Default::default()
        };
        let sender = BundleSender::new(
            Arc::clone(&rpc),
            relay,
            payer,
            SubmitConfig::default(),
            bundle_config,
        )
        .with_lookup_tables(lookup_tables);

        info!(tip_lamports, bundle_size = cli.bundle_size, "using bundled submission");
        Arc::new(BundledPusher::new(
            Arc::clone(&source),
            sender,
            finder.clone(),
            cli.shard_id,
            Arc::clone(&liveness),
        ))
    } else {
        let fee_config = FeeConfig {
            fee_multiplier: cli.fee_multiplier,
            max_fee_micro_lamports: cli.max_fee_micro_lamports,
            ..Default::default()
        };
        let fee = match cli.compute_unit_price_micro_lamports {
            Some(micro_lamports) => FeeEstimator::fixed(micro_lamports, fee_config),
            None => {
                let watched = feeds
                    .iter()
                    .map(|feed| finder.find_feed_address(cli.shard_id, &feed.id).0)
                    .collect();
                FeeEstimator::subscribed(Arc::clone(&rpc), watched, fee_config)
            }
        };

        let additional = additional_send_clients(cli.additional_send_endpoints.as_deref());
        let sender = DirectSender::new(Arc::clone(&rpc), payer, SubmitConfig::default())
            .with_additional_endpoints(additional)
            .with_lookup_tables(lookup_tables);

        info!("using direct submission");
        Arc::new(DirectPusher::new(
            Arc::clone(&source),
            sender,
            fee,
            finder.clone(),
            cli.shard_id,
            Arc::clone(&liveness),
        ))
    };

    info!(
        feeds = feeds.len(),
        endpoint = cli.endpoint.as_str(),
        "oracle pusher starting"
    );

    let controller = Controller::new(
        feeds,
        source,
        listener,
        pusher,
        PushThresholds::default(),
        Duration::from_secs(cli.pushing_frequency_secs),
        Duration::from_secs(cli.polling_frequency_secs),
    );
    controller.run().await;

    Ok(())
}

fn additional_send_clients(endpoints: Option<&str>) -> Vec<Arc<RpcClient>> {
    endpoints
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|endpoint| !endpoint.is_empty())
        .map(|endpoint| Arc::new(RpcClient::new(endpoint.to_string())))
        .collect()
}

/// Fetched once; the table is held for the process lifetime and a changed
/// table requires a restart.
async fn fetch_lookup_table(rpc: &RpcClient, key: Pubkey) -> Result<AddressLookupTableAccount> {
    let account = rpc
        .get_account(&key)
        .await
        .with_context(|| format!("fetching address lookup table {key}"))?;
    let table = AddressLookupTable::deserialize(&account.data)
        .map_err(|e| anyhow!("deserializing address lookup table {key}: {e}"))?;

    Ok(AddressLookupTableAccount {
        key,
        addresses: table.addresses.to_vec(),
    })
}
