//! Decision engine: checker fan-out, gates and side effects.
//!
//! Gate order is fixed: liquidity floor, then metadata mutability, then the
//! reputation gates (copycat flag, score threshold). The first failing gate
//! decides; later gates are not consulted. A reputation score of -1 (lookup
//! failed) passes the score gate and lands in the alert-only branch.

use crate::pipeline::alert::{format_alert_message, AlertKind, Notifier, TokenAlert};
use crate::pipeline::error::CheckError;
use crate::pipeline::holders::HoldersChecker;
use crate::pipeline::liquidity::LiquidityChecker;
use crate::pipeline::marketdata::{format_market_lines, MarketdataClient};
use crate::pipeline::metadata::MetadataChecker;
use crate::pipeline::reputation::ReputationApi;
use crate::pipeline::storage::CandidateStore;
use crate::types::{
    EvaluationOutcome, LiquidityReport, MetadataReport, PoolCandidate, RejectReason,
    ReputationReport, StoredCandidate, Verdict,
};
use chrono::Utc;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Pre-reputation gates, in order.
pub fn pre_screen(
    metadata: &MetadataReport,
    liquidity: &LiquidityReport,
    liquidity_floor_usd: f64,
) -> Option<RejectReason> {
    if liquidity.total_liquidity_usd < liquidity_floor_usd {
        return Some(RejectReason::InsufficientLiquidity);
    }
    if metadata.is_mutable {
        return Some(RejectReason::MutableMetadata);
    }
    None
}

/// Reputation gates. `score > threshold` reads as high risk and is stored
/// quietly; everything else is alerted immediately.
pub fn classify(reputation: &ReputationReport, score_threshold: i64) -> Verdict {
    if reputation.has_copycat_flag() {
        return Verdict::Rejected(RejectReason::CopycatFlag);
    }
    if reputation.score > score_threshold {
        Verdict::Stored
    } else {
        Verdict::AlertedOnly
    }
}

pub struct EvaluationPipeline {
    metadata: MetadataChecker,
    holders: HoldersChecker,
    liquidity: LiquidityChecker,
    reputation: Arc<dyn ReputationApi>,
    store: Arc<dyn CandidateStore>,
    notifier: Arc<dyn Notifier>,
    marketdata: Option<MarketdataClient>,
    dex_name: String,
    liquidity_floor_usd: f64,
    score_threshold: i64,
    in_flight: Mutex<HashSet<Pubkey>>,
}

impl EvaluationPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        metadata: MetadataChecker,
        holders: HoldersChecker,
        liquidity: LiquidityChecker,
        reputation: Arc<dyn ReputationApi>,
        store: Arc<dyn CandidateStore>,
        notifier: Arc<dyn Notifier>,
        marketdata: Option<MarketdataClient>,
        dex_name: String,
        liquidity_floor_usd: f64,
        score_threshold: i64,
    ) -> Self {
        Self {
            metadata,
            holders,
            liquidity,
            reputation,
            store,
            notifier,
            marketdata,
            dex_name,
            liquidity_floor_usd,
            score_threshold,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Run the checkers and derive a verdict, without side effects. The live
    /// listener and the recheck sweep both come through here, serialized per
    /// mint by the in-flight set.
    pub async fn evaluate(&self, candidate: &PoolCandidate) -> Result<EvaluationOutcome, CheckError> {
        if !self.in_flight.lock().await.insert(candidate.mint) {
            return Err(CheckError::InFlight {
                mint: candidate.mint,
            });
        }
        let result = self.evaluate_inner(candidate).await;
        self.in_flight.lock().await.remove(&candidate.mint);
        result
    }

    async fn evaluate_inner(
        &self,
        candidate: &PoolCandidate,
    ) -> Result<EvaluationOutcome, CheckError> {
        let (metadata, holders, liquidity) = tokio::join!(
            self.metadata.check(&candidate.mint),
            self.holders.check(&candidate.mint),
            self.liquidity.check(&candidate.pool),
        );
        // Siblings are never cancelled; a fatal holders result is acted on
        // only after all three finish.
        let holders = holders?;

        if let Some(reason) = pre_screen(&metadata, &liquidity, self.liquidity_floor_usd) {
            return Ok(EvaluationOutcome {
                candidate: candidate.clone(),
                metadata,
                holders,
                liquidity,
                reputation: None,
                verdict: Verdict::Rejected(reason),
            });
        }

        let reputation = self.reputation.report(&candidate.mint).await;
        let verdict = classify(&reputation, self.score_threshold);
        Ok(EvaluationOutcome {
            candidate: candidate.clone(),
            metadata,
            holders,
            liquidity,
            reputation: Some(reputation),
            verdict,
        })
    }

    /// First-pass entry point: evaluate, then persist or alert.
    pub async fn process_discovery(
        &self,
        candidate: PoolCandidate,
    ) -> Result<EvaluationOutcome, CheckError> {
        let outcome = self.evaluate(&candidate).await?;
        match outcome.verdict {
            Verdict::Rejected(reason) => {
                info!(mint = %candidate.mint, reason = reason.as_str(), "candidate rejected");
            }
            Verdict::Stored => {
                let stored = self.project(&outcome);
                let id = self
                    .store
                    .insert_candidate(&stored)
                    .await
                    .map_err(CheckError::Other)?;
                info!(mint = %candidate.mint, id, score = stored.score, "candidate stored for recheck");
            }
            Verdict::AlertedOnly => {
                info!(mint = %candidate.mint, "candidate alerted");
                self.alert_outcome(AlertKind::Discovery, &outcome).await;
            }
        }
        Ok(outcome)
    }

    /// Render and deliver an alert from an evaluation outcome, enriched with
    /// pair statistics when the aggregator already lists the mint. Both the
    /// enrichment and the delivery are failure-tolerant.
    pub(crate) async fn alert_outcome(&self, kind: AlertKind, outcome: &EvaluationOutcome) {
        let alert = TokenAlert::from_outcome(kind, &self.dex_name, outcome);
        let mut message = format_alert_message(&alert);
        if let Some(marketdata) = &self.marketdata {
            match marketdata.best_pair(&outcome.candidate.mint).await {
                Ok(Some(pair)) => {
                    message.push('\n');
                    message.push_str(&format_market_lines(&pair));
                }
                Ok(None) => {}
                Err(e) => {
                    debug!(mint = %alert.mint, error = %e, "market-data enrichment unavailable");
                }
            }
        }
        if let Err(e) = self.notifier.send(&message).await {
            error!(mint = %alert.mint, error = %e, "alert delivery failed");
        }
    }

    fn project(&self, outcome: &EvaluationOutcome) -> StoredCandidate {
        let reputation = outcome.reputation.as_ref();
        StoredCandidate {
            id: None,
            dex: self.dex_name.clone(),
            name: outcome.metadata.name.clone(),
            symbol: outcome.metadata.symbol.clone(),
            mint: outcome.candidate.mint,
            pool: outcome.candidate.pool,
            price_usd: outcome.liquidity.base_token_price_usd,
            liquidity_usd: outcome.liquidity.total_liquidity_usd,
            telegram: outcome.metadata.telegram.clone(),
            website: outcome.metadata.website.clone(),
            twitter: outcome.metadata.twitter.clone(),
            risk_flags: reputation.map(|r| r.risks.clone()).unwrap_or_default(),
            score: reputation.map(|r| r.score).unwrap_or(-1),
            created_at: Utc::now(),
        }
    }
}

impl std::fmt::Debug for EvaluationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationPipeline")
            .field("dex_name", &self.dex_name)
            .field("liquidity_floor_usd", &self.liquidity_floor_usd)
            .field("score_threshold", &self.score_threshold)
            .finish_non_exhaustive()
    }
}
