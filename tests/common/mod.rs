//! Shared fixtures: an in-memory ledger, a scripted reputation service and a
//! capturing notifier, wired into a real evaluation pipeline over an
//! in-memory SQLite store.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use pool_sentinel::config::PipelineConfig;
use pool_sentinel::pipeline::ledger::{LedgerReader, MintInfo, TokenAmount, TokenHolding};
use pool_sentinel::pipeline::{
    CandidateStore, EvaluationPipeline, HoldersChecker, LiquidityChecker, MetadataChecker,
    Notifier, PriceCache, ReputationApi, SqliteCandidateStore,
};
use pool_sentinel::types::{PoolCandidate, ReputationReport, TransactionEnvelope};
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// AMM v4 account offsets mirrored from the production decoder.
const BASE_VAULT_OFFSET: usize = 336;
const QUOTE_VAULT_OFFSET: usize = 368;
const LP_MINT_OFFSET: usize = 464;
const LP_RESERVE_OFFSET: usize = 720;
const AMM_STATE_LEN: usize = 752;

pub fn pool_account_bytes(
    base_vault: &Pubkey,
    quote_vault: &Pubkey,
    lp_mint: &Pubkey,
    lp_reserve: u64,
) -> Vec<u8> {
    let mut data = vec![0u8; AMM_STATE_LEN];
    data[BASE_VAULT_OFFSET..BASE_VAULT_OFFSET + 32].copy_from_slice(base_vault.as_ref());
    data[QUOTE_VAULT_OFFSET..QUOTE_VAULT_OFFSET + 32].copy_from_slice(quote_vault.as_ref());
    data[LP_MINT_OFFSET..LP_MINT_OFFSET + 32].copy_from_slice(lp_mint.as_ref());
    data[LP_RESERVE_OFFSET..LP_RESERVE_OFFSET + 8].copy_from_slice(&lp_reserve.to_le_bytes());
    data
}

#[derive(Default)]
pub struct FakeLedger {
    pub accounts: HashMap<Pubkey, Vec<u8>>,
    pub mints: HashMap<Pubkey, MintInfo>,
    pub balances: HashMap<Pubkey, f64>,
    pub supply: u64,
    pub holdings: Vec<TokenHolding>,
    pub owners: HashMap<Pubkey, Pubkey>,
}

#[async_trait]
impl LedgerReader for FakeLedger {
    async fn account_data(&self, account: &Pubkey) -> Result<Vec<u8>> {
        self.accounts
            .get(account)
            .cloned()
            .ok_or_else(|| anyhow!("unknown account {account}"))
    }

    async fn mint_info(&self, mint: &Pubkey) -> Result<MintInfo> {
        self.mints
            .get(mint)
            .copied()
            .ok_or_else(|| anyhow!("unknown mint {mint}"))
    }

    async fn token_supply(&self, _mint: &Pubkey) -> Result<TokenAmount> {
        Ok(TokenAmount {
            amount: self.supply,
            decimals: 9,
        })
    }

    async fn token_largest_accounts(&self, _mint: &Pubkey) -> Result<Vec<TokenHolding>> {
        Ok(self.holdings.clone())
    }

    async fn token_account_balance(&self, account: &Pubkey) -> Result<f64> {
        self.balances
            .get(account)
            .copied()
            .ok_or_else(|| anyhow!("unknown token account {account}"))
    }

    async fn token_account_owner(&self, account: &Pubkey) -> Result<Option<Pubkey>> {
        Ok(self.owners.get(account).copied())
    }

    async fn transaction_envelope(&self, _signature: &str) -> Result<Option<TransactionEnvelope>> {
        Ok(None)
    }
}

pub struct ScriptedReputation {
    pub report: Mutex<ReputationReport>,
    pub calls: AtomicUsize,
}

impl ScriptedReputation {
    pub fn new(report: ReputationReport) -> Self {
        Self {
            report: Mutex::new(report),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReputationApi for ScriptedReputation {
    async fn report(&self, _mint: &Pubkey) -> ReputationReport {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.report.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct CapturingNotifier {
    pub messages: Mutex<Vec<String>>,
}

impl CapturingNotifier {
    pub fn sent(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for CapturingNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub pipeline: Arc<EvaluationPipeline>,
    pub store: Arc<dyn CandidateStore>,
    pub notifier: Arc<CapturingNotifier>,
    pub reputation: Arc<ScriptedReputation>,
    pub candidate: PoolCandidate,
}

/// A pipeline whose pool holds `quote_balance` quote units priced at
/// `quote_price_usd`; total liquidity is `2 * quote_balance * quote_price_usd`.
pub async fn build_harness(
    quote_balance: f64,
    quote_price_usd: f64,
    report: ReputationReport,
) -> Harness {
    let config = PipelineConfig::default();

    let mint = Pubkey::new_unique();
    let pool = Pubkey::new_unique();
    let base_vault = Pubkey::new_unique();
    let quote_vault = Pubkey::new_unique();
    let lp_mint = Pubkey::new_unique();
    let holder_account = Pubkey::new_unique();
    let holder_wallet = Pubkey::new_unique();

    let mut ledger = FakeLedger {
        supply: 1_000_000,
        holdings: vec![TokenHolding {
            address: holder_account,
            amount: 100_000,
            decimals: 9,
        }],
        ..Default::default()
    };
    ledger
        .accounts
        .insert(pool, pool_account_bytes(&base_vault, &quote_vault, &lp_mint, 1_000_000_000));
    ledger.balances.insert(base_vault, 500_000.0);
    ledger.balances.insert(quote_vault, quote_balance);
    ledger.mints.insert(
        lp_mint,
        MintInfo {
            supply: 1_000_000_000,
            decimals: 9,
            has_mint_authority: false,
            has_freeze_authority: false,
        },
    );
    ledger.owners.insert(holder_account, holder_wallet);
    let ledger: Arc<dyn LedgerReader> = Arc::new(ledger);

    let price_cache = PriceCache::new();
    price_cache.publish(quote_price_usd).await;

    let http = reqwest::Client::new();
    let metadata = MetadataChecker::new(
        Arc::clone(&ledger),
        http,
        Pubkey::new_unique(),
        config.fair_launch_origin.clone(),
        Duration::from_secs(1),
    );
    let holders = HoldersChecker::new(Arc::clone(&ledger), Pubkey::new_unique());
    let liquidity = LiquidityChecker::new(
        Arc::clone(&ledger),
        price_cache,
        config.burnt_locked_threshold,
    );

    let reputation = Arc::new(ScriptedReputation::new(report));
    let notifier = Arc::new(CapturingNotifier::default());
    let store: Arc<dyn CandidateStore> = Arc::new(
        SqliteCandidateStore::connect("sqlite::memory:")
            .await
            .unwrap(),
    );

    let pipeline = Arc::new(EvaluationPipeline::new(
        metadata,
        holders,
        liquidity,
        Arc::clone(&reputation) as Arc<dyn ReputationApi>,
        Arc::clone(&store),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        None,
        config.dex_name.clone(),
        config.liquidity_floor_usd,
        config.score_threshold,
    ));

    Harness {
        pipeline,
        store,
        notifier,
        reputation,
        candidate: PoolCandidate {
            mint,
            pool,
            discovered_at: chrono::Utc::now(),
        },
    }
}
