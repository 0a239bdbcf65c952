//! Core types and data structures for the pool-sentinel pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::VersionedTransaction;

/// A log notification delivered by the ledger subscription, keyed by the
/// watched program id.
#[derive(Debug, Clone)]
pub struct LogsEvent {
    pub signature: String,
    pub logs: Vec<String>,
}

/// A compiled instruction as it appears inside a transaction message.
#[derive(Debug, Clone)]
pub struct CompiledIx {
    pub program_id_index: u8,
    pub data: Vec<u8>,
    pub account_key_indexes: Vec<u8>,
}

/// Immutable view of a fetched transaction: the global account table plus the
/// ordered compiled instructions. Produced by the ledger reader, consumed only
/// by the instruction decoder.
#[derive(Debug, Clone)]
pub struct TransactionEnvelope {
    pub static_account_keys: Vec<Pubkey>,
    pub instructions: Vec<CompiledIx>,
}

impl TransactionEnvelope {
    pub fn from_versioned(tx: &VersionedTransaction) -> Self {
        Self {
            static_account_keys: tx.message.static_account_keys().to_vec(),
            instructions: tx
                .message
                .instructions()
                .iter()
                .map(|ix| CompiledIx {
                    program_id_index: ix.program_id_index,
                    data: ix.data.clone(),
                    account_key_indexes: ix.accounts.clone(),
                })
                .collect(),
        }
    }
}

/// A newly discovered pool listing. One per detected pool-creation event;
/// never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolCandidate {
    pub mint: Pubkey,
    pub pool: Pubkey,
    pub discovered_at: DateTime<Utc>,
}

impl PoolCandidate {
    pub fn new(mint: Pubkey, pool: Pubkey) -> Self {
        Self {
            mint,
            pool,
            discovered_at: Utc::now(),
        }
    }
}

/// Result of the metadata checker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataReport {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub image_url: String,
    pub telegram: String,
    pub website: String,
    pub twitter: String,
    pub is_mutable: bool,
    pub is_mintable: bool,
    pub is_freezable: bool,
    pub is_pump_fun_origin: bool,
    /// Structural validity of the on-chain record (required fields present,
    /// seller fee in range, creators verified with sane shares).
    pub is_valid: bool,
}

impl MetadataReport {
    pub fn has_social_links(&self) -> bool {
        !self.telegram.is_empty() || !self.website.is_empty() || !self.twitter.is_empty()
    }
}

/// One entry of the whale list produced by the holders checker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopHolder {
    pub address: Pubkey,
    pub amount: u64,
    pub percentage: f64,
}

/// Result of the holders checker. `top_holders_percentage` and
/// `raydium_pool_percentage` partition the supply held by the largest
/// accounts: custody balances never appear in the whale list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoldersReport {
    pub top_holders: Vec<TopHolder>,
    pub top_holders_percentage: f64,
    pub raydium_pool_percentage: f64,
}

/// Result of the liquidity checker. Any remote-read or decode failure leaves
/// `has_liquidity = false` and the rest zeroed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiquidityReport {
    pub has_liquidity: bool,
    pub is_liquidity_locked: bool,
    pub burnt_percentage: f64,
    pub lp_reserve: f64,
    pub total_liquidity_usd: f64,
    pub base_token_price_usd: f64,
    pub pool_address: Option<Pubkey>,
}

/// A named risk flag from the reputation service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskFlag {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub level: String,
}

/// Reputation summary for one mint. A score of -1 marks a failed lookup and
/// deliberately reads as low risk downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationReport {
    #[serde(default)]
    pub risks: Vec<RiskFlag>,
    #[serde(default)]
    pub score: i64,
}

impl ReputationReport {
    /// Conservative default used when the reputation service fails.
    pub fn unavailable() -> Self {
        Self {
            risks: Vec::new(),
            score: -1,
        }
    }

    pub fn has_copycat_flag(&self) -> bool {
        self.risks
            .iter()
            .any(|risk| risk.name.to_lowercase().contains("copycat"))
    }
}

/// Why a candidate was rejected by the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    InsufficientLiquidity,
    MutableMetadata,
    CopycatFlag,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::InsufficientLiquidity => "insufficient liquidity",
            RejectReason::MutableMetadata => "mutable metadata",
            RejectReason::CopycatFlag => "copycat flag",
        }
    }
}

/// Terminal state of one evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Rejected(RejectReason),
    /// Persist and enter the recheck cycle; no immediate alert.
    Stored,
    /// Alert immediately, do not persist.
    AlertedOnly,
}

/// The joined checker outputs plus the derived verdict. Never persisted as-is;
/// only the accept branch is projected into a [`StoredCandidate`].
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    pub candidate: PoolCandidate,
    pub metadata: MetadataReport,
    pub holders: HoldersReport,
    pub liquidity: LiquidityReport,
    pub reputation: Option<ReputationReport>,
    pub verdict: Verdict,
}

/// Persisted accept-branch projection, one row of `new_tokens`.
#[derive(Debug, Clone)]
pub struct StoredCandidate {
    pub id: Option<i64>,
    pub dex: String,
    pub name: String,
    pub symbol: String,
    pub mint: Pubkey,
    pub pool: Pubkey,
    pub price_usd: f64,
    pub liquidity_usd: f64,
    pub telegram: String,
    pub website: String,
    pub twitter: String,
    pub risk_flags: Vec<RiskFlag>,
    pub score: i64,
    pub created_at: DateTime<Utc>,
}

/// Shared quote-asset price. Written by exactly one refresher task; read
/// concurrently and stale-tolerantly by the liquidity checker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    pub price_usd: f64,
    pub as_of: DateTime<Utc>,
}
