//! Pipeline configuration.
//!
//! Everything tunable lives here: program ids, ABI account positions,
//! thresholds, intervals and endpoints. Values are code defaults; secrets and
//! endpoints can be overridden from the environment at bootstrap.

use serde::{Deserialize, Serialize};
use std::env;

/// Account positions inside the pool-initialization instruction. These are
/// program-ABI constants for one known instruction shape, carried as
/// configuration rather than derived.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InstructionLayout {
    pub mint_account_position: usize,
    pub pool_account_position: usize,
}

impl Default for InstructionLayout {
    fn default() -> Self {
        Self {
            mint_account_position: 8,
            pool_account_position: 4,
        }
    }
}

/// Full pipeline configuration with sensible mainnet defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// HTTP RPC endpoint for ledger reads.
    pub rpc_url: String,
    /// WebSocket endpoint for the log subscription.
    pub ws_url: String,
    /// The watched DEX program (Raydium AMM v4).
    pub dex_program_id: String,
    /// Log marker identifying a pool-creation transaction.
    pub pool_init_marker: String,
    /// Display name of the DEX, used in alerts and stored rows.
    pub dex_name: String,
    /// Wrapped quote-asset mint; pool creations for it are ignored.
    pub wrapped_sol_mint: String,
    /// Custody wallet whose balances count as pool liquidity, not whales.
    pub pool_custody_wallet: String,
    /// Token-metadata program owning the per-mint metadata PDA.
    pub metadata_program_id: String,
    /// Off-chain `createdOn` value marking a fair-launch origin.
    pub fair_launch_origin: String,

    /// Reputation API base, e.g. `https://api.rugcheck.xyz/v1`.
    pub reputation_base_url: String,
    /// Requests per second allowed against the reputation API.
    pub reputation_rate_limit_per_second: u32,
    /// Quote-asset price endpoint.
    pub price_api_url: String,
    /// Market-data (pair statistics) endpoint base.
    pub marketdata_base_url: String,

    /// SQLite database URL.
    pub database_url: String,
    /// Telegram bot token; empty disables delivery.
    pub telegram_bot_token: String,
    /// Telegram channel, e.g. `@newpools`.
    pub telegram_channel: String,

    /// Account positions for the pool-init instruction.
    pub instruction_layout: InstructionLayout,
    /// Gate 1: minimum total pool liquidity in USD.
    pub liquidity_floor_usd: f64,
    /// Gate 4: reputation scores above this are stored for recheck.
    pub score_threshold: i64,
    /// Burnt LP percentage above which liquidity counts as locked.
    pub burnt_locked_threshold: f64,

    /// Wait after discovery before the first evaluation, seconds.
    pub startup_delay_secs: u64,
    /// Quote price refresh interval, seconds.
    pub price_refresh_secs: u64,
    /// Recheck sweep interval, seconds.
    pub recheck_interval_secs: u64,
    /// Lower bound of the recheck window, seconds since creation.
    pub recheck_window_secs: i64,
    /// Stored candidates older than this are expired, seconds.
    pub expiry_secs: i64,
    /// Request timeout for off-chain JSON fetches, seconds.
    pub offchain_fetch_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            ws_url: "wss://api.mainnet-beta.solana.com".to_string(),
            dex_program_id: "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8".to_string(),
            pool_init_marker: "initialize2".to_string(),
            dex_name: "Raydium".to_string(),
            wrapped_sol_mint: "So11111111111111111111111111111111111111112".to_string(),
            pool_custody_wallet: "5Q544fKrFoe6tsEbD7S8EmxGTJYAKtTVhAW5Q5pge4j1".to_string(),
            metadata_program_id: "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s".to_string(),
            fair_launch_origin: "https://pump.fun".to_string(),
            reputation_base_url: "https://api.rugcheck.xyz/v1".to_string(),
            reputation_rate_limit_per_second: 2,
            price_api_url:
                "https://api.coingecko.com/api/v3/simple/price?ids=solana&vs_currencies=usd"
                    .to_string(),
            marketdata_base_url: "https://api.dexscreener.com".to_string(),
            database_url: "sqlite:./sentinel.db?mode=rwc".to_string(),
            telegram_bot_token: String::new(),
            telegram_channel: String::new(),
            instruction_layout: InstructionLayout::default(),
            liquidity_floor_usd: 3000.0,
            score_threshold: 400,
            burnt_locked_threshold: 95.0,
            startup_delay_secs: 20,
            price_refresh_secs: 60,
            recheck_interval_secs: 60,
            recheck_window_secs: 60,
            expiry_secs: 120,
            offchain_fetch_timeout_secs: 300,
        }
    }
}

impl PipelineConfig {
    /// Defaults with environment overrides for endpoints and secrets.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = env::var("RPC_URL") {
            config.rpc_url = url;
        }
        if let Ok(url) = env::var("WS_URL") {
            config.ws_url = url;
        }
        if let Ok(program) = env::var("DEX_PROGRAM_ID") {
            config.dex_program_id = program;
        }
        if let Ok(url) = env::var("DATABASE_URL") {
            config.database_url = url;
        }
        if let Ok(url) = env::var("REPUTATION_BASE_URL") {
            config.reputation_base_url = url;
        }
        if let Ok(token) = env::var("TELEGRAM_BOT_TOKEN") {
            config.telegram_bot_token = token;
        }
        if let Ok(channel) = env::var("TELEGRAM_CHANNEL") {
            config.telegram_channel = channel;
        }
        config
    }
}
