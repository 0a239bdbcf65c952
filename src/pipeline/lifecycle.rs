//! Candidate lifecycle: periodic recheck and expiry of stored candidates.
//!
//! Every sweep classifies each stored row by its age. Young rows are left
//! alone, rows inside the recheck band get a full re-evaluation, and rows
//! past expiry are deleted without another look. A candidate whose recheck
//! comes back alert-only "graduates": the delayed alert goes out and the row
//! stays until the expiry boundary removes it.
//!
//! The sweep ticks on a fixed interval, so a row can drift through the
//! recheck band between ticks and expire unevaluated. That window is
//! accepted; see the expiry tests.

use crate::pipeline::alert::AlertKind;
use crate::pipeline::engine::EvaluationPipeline;
use crate::pipeline::error::CheckError;
use crate::pipeline::storage::CandidateStore;
use crate::types::{PoolCandidate, StoredCandidate, Verdict};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Age band of a stored candidate at sweep time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBand {
    Fresh,
    Recheck,
    Expired,
}

pub fn classify_age(
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    recheck_after_secs: i64,
    expire_after_secs: i64,
) -> AgeBand {
    let age_secs = (now - created_at).num_seconds();
    if age_secs >= expire_after_secs {
        AgeBand::Expired
    } else if age_secs >= recheck_after_secs {
        AgeBand::Recheck
    } else {
        AgeBand::Fresh
    }
}

pub struct LifecycleManager {
    pipeline: Arc<EvaluationPipeline>,
    store: Arc<dyn CandidateStore>,
    recheck_after_secs: i64,
    expire_after_secs: i64,
    interval: Duration,
}

impl LifecycleManager {
    pub fn new(
        pipeline: Arc<EvaluationPipeline>,
        store: Arc<dyn CandidateStore>,
        recheck_after_secs: i64,
        expire_after_secs: i64,
        interval: Duration,
    ) -> Self {
        Self {
            pipeline,
            store,
            recheck_after_secs,
            expire_after_secs,
            interval,
        }
    }

    /// One sweep over every stored candidate; public so tests can drive
    /// ticks with a chosen clock. A failing row never blocks the rest of
    /// the sweep.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<()> {
        let candidates = self.store.all_candidates().await?;
        for candidate in candidates {
            let Some(id) = candidate.id else {
                warn!(mint = %candidate.mint, "stored candidate without id, skipping");
                continue;
            };
            match classify_age(
                candidate.created_at,
                now,
                self.recheck_after_secs,
                self.expire_after_secs,
            ) {
                AgeBand::Fresh => {}
                AgeBand::Expired => {
                    info!(mint = %candidate.mint, id, "candidate expired, deleting");
                    if let Err(e) = self.store.delete_candidate(id).await {
                        error!(mint = %candidate.mint, id, error = %e, "expired row delete failed");
                    }
                }
                AgeBand::Recheck => {
                    if let Err(e) = self.recheck(id, &candidate).await {
                        error!(mint = %candidate.mint, id, error = %e, "recheck row handling failed");
                    }
                }
            }
        }
        Ok(())
    }

    async fn recheck(&self, id: i64, candidate: &StoredCandidate) -> Result<()> {
        let pool_candidate = PoolCandidate {
            mint: candidate.mint,
            pool: candidate.pool,
            discovered_at: candidate.created_at,
        };
        let outcome = match self.pipeline.evaluate(&pool_candidate).await {
            Ok(outcome) => outcome,
            Err(CheckError::InFlight { mint }) => {
                debug!(%mint, "recheck skipped, evaluation already running");
                return Ok(());
            }
            Err(CheckError::NoHolders { mint }) => {
                info!(%mint, id, "recheck found no holders, deleting");
                self.store.delete_candidate(id).await?;
                return Ok(());
            }
            Err(CheckError::Other(e)) => {
                // Transient; the row stays for the next sweep or expiry.
                error!(mint = %candidate.mint, error = %e, "recheck failed");
                return Ok(());
            }
        };

        match outcome.verdict {
            Verdict::Rejected(reason) => {
                info!(mint = %candidate.mint, id, reason = reason.as_str(), "recheck rejected, deleting");
                self.store.delete_candidate(id).await?;
            }
            Verdict::Stored => {
                info!(mint = %candidate.mint, id, "recheck still high risk, deleting");
                self.store.delete_candidate(id).await?;
            }
            Verdict::AlertedOnly => {
                info!(mint = %candidate.mint, id, "candidate graduated, alerting");
                // The delayed alert carries the recheck's own price, liquidity
                // and score, not the row persisted at store time.
                self.pipeline
                    .alert_outcome(AlertKind::Graduation, &outcome)
                    .await;
            }
        }
        Ok(())
    }

    /// Timer-driven sweep loop.
    pub async fn run(self) {
        info!(
            interval_secs = self.interval.as_secs(),
            "lifecycle manager running"
        );
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.sweep_once(Utc::now()).await {
                error!(error = %e, "lifecycle sweep failed");
            }
        }
    }
}
