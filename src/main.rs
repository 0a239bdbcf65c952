use anyhow::{Context, Result};
use pool_sentinel::config::PipelineConfig;
use pool_sentinel::pipeline::{
    run_log_subscription, CandidateIntake, CandidateStore, EvaluationPipeline, HoldersChecker,
    LedgerReader, LifecycleManager, LiquidityChecker, MarketdataClient, MetadataChecker, Notifier,
    PoolWatcher, PriceCache, PriceRefresher, ReputationApi, ReputationClient, RpcLedgerReader,
    SqliteCandidateStore, TelegramNotifier,
};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const RPC_TIMEOUT: Duration = Duration::from_secs(30);
const RESUBSCRIBE_PAUSE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = PipelineConfig::from_env();
    info!(dex = %config.dex_name, program = %config.dex_program_id, "pool sentinel starting");

    let dex_program_id =
        Pubkey::from_str(&config.dex_program_id).context("invalid DEX program id")?;
    let wrapped_sol_mint =
        Pubkey::from_str(&config.wrapped_sol_mint).context("invalid wrapped SOL mint")?;
    let pool_custody_wallet =
        Pubkey::from_str(&config.pool_custody_wallet).context("invalid custody wallet")?;
    let metadata_program_id =
        Pubkey::from_str(&config.metadata_program_id).context("invalid metadata program id")?;

    let store: Arc<dyn CandidateStore> =
        Arc::new(SqliteCandidateStore::connect(&config.database_url).await?);
    let http = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;
    let ledger: Arc<dyn LedgerReader> =
        Arc::new(RpcLedgerReader::new(config.rpc_url.clone(), RPC_TIMEOUT));

    let price_cache = PriceCache::new();
    let refresher = PriceRefresher::new(
        http.clone(),
        price_cache.clone(),
        Arc::clone(&store),
        config.price_api_url.clone(),
        Duration::from_secs(config.price_refresh_secs),
    );
    if let Err(e) = refresher.refresh_once().await {
        warn!(error = %e, "initial price fetch failed, liquidity checks degrade until the next tick");
    }
    tokio::spawn(refresher.run());

    let metadata = MetadataChecker::new(
        Arc::clone(&ledger),
        http.clone(),
        metadata_program_id,
        config.fair_launch_origin.clone(),
        Duration::from_secs(config.offchain_fetch_timeout_secs),
    );
    let holders = HoldersChecker::new(Arc::clone(&ledger), pool_custody_wallet);
    let liquidity = LiquidityChecker::new(
        Arc::clone(&ledger),
        price_cache.clone(),
        config.burnt_locked_threshold,
    );
    let reputation: Arc<dyn ReputationApi> = Arc::new(ReputationClient::new(
        http.clone(),
        config.reputation_base_url.clone(),
        config.reputation_rate_limit_per_second,
    ));
    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(
        http.clone(),
        config.telegram_bot_token.clone(),
        config.telegram_channel.clone(),
    ));
    let marketdata = MarketdataClient::new(http, config.marketdata_base_url.clone());

    let pipeline = Arc::new(EvaluationPipeline::new(
        metadata,
        holders,
        liquidity,
        reputation,
        Arc::clone(&store),
        notifier,
        Some(marketdata),
        config.dex_name.clone(),
        config.liquidity_floor_usd,
        config.score_threshold,
    ));

    let lifecycle = LifecycleManager::new(
        Arc::clone(&pipeline),
        Arc::clone(&store),
        config.recheck_window_secs,
        config.expiry_secs,
        Duration::from_secs(config.recheck_interval_secs),
    );
    tokio::spawn(lifecycle.run());

    let (events_tx, events_rx) = mpsc::channel(256);
    let intake = CandidateIntake::new(
        ledger,
        dex_program_id,
        config.pool_init_marker.clone(),
        wrapped_sol_mint,
        config.instruction_layout,
    );
    let watcher = PoolWatcher::new(
        events_rx,
        intake,
        pipeline,
        Duration::from_secs(config.startup_delay_secs),
    );
    tokio::spawn(watcher.run());

    loop {
        if let Err(e) = run_log_subscription(&config.ws_url, &dex_program_id, events_tx.clone()).await
        {
            error!(error = %e, "log subscription dropped");
        }
        tokio::time::sleep(RESUBSCRIBE_PAUSE).await;
        info!("re-establishing log subscription");
    }
}
