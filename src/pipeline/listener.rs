//! Log-stream listener: from websocket notifications to candidate intake.
//!
//! The subscription task forwards raw log notifications over a channel. The
//! intake filters for the pool-initialization marker, deduplicates
//! signatures, decodes the transaction and skips wrapped-SOL base mints; the
//! watcher hands surviving candidates to the evaluation pipeline after a
//! settle delay. The delay gives indexers and vault balances time to catch up
//! before the first read.

use crate::config::InstructionLayout;
use crate::pipeline::decoder::extract_candidate;
use crate::pipeline::engine::EvaluationPipeline;
use crate::pipeline::error::CheckError;
use crate::pipeline::ledger::LedgerReader;
use crate::types::{LogsEvent, PoolCandidate};
use anyhow::{Context, Result};
use futures::StreamExt;
use solana_client::nonblocking::pubsub_client::PubsubClient;
use solana_client::rpc_config::{RpcTransactionLogsConfig, RpcTransactionLogsFilter};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Cap on the signature dedup set before it is reset wholesale.
const SEEN_SIGNATURES_CAP: usize = 10_000;

/// Subscribe to logs mentioning the DEX program and forward them until the
/// stream or the channel closes.
pub async fn run_log_subscription(
    ws_url: &str,
    program_id: &Pubkey,
    events: mpsc::Sender<LogsEvent>,
) -> Result<()> {
    let client = PubsubClient::new(ws_url)
        .await
        .context("websocket connect failed")?;
    let (mut stream, _unsubscribe) = client
        .logs_subscribe(
            RpcTransactionLogsFilter::Mentions(vec![program_id.to_string()]),
            RpcTransactionLogsConfig {
                commitment: Some(CommitmentConfig::confirmed()),
            },
        )
        .await
        .context("logs subscription failed")?;
    info!(%program_id, "log subscription established");

    while let Some(notification) = stream.next().await {
        let event = LogsEvent {
            signature: notification.value.signature,
            logs: notification.value.logs,
        };
        if events.send(event).await.is_err() {
            break;
        }
    }
    info!("log stream ended");
    Ok(())
}

/// Turns raw log events into pool candidates: marker filter, signature
/// dedup, transaction fetch, instruction decode, wrapped-SOL skip.
pub struct CandidateIntake {
    ledger: Arc<dyn LedgerReader>,
    dex_program_id: Pubkey,
    pool_init_marker: String,
    wrapped_sol_mint: Pubkey,
    layout: InstructionLayout,
    seen_signatures: HashSet<String>,
}

impl CandidateIntake {
    pub fn new(
        ledger: Arc<dyn LedgerReader>,
        dex_program_id: Pubkey,
        pool_init_marker: String,
        wrapped_sol_mint: Pubkey,
        layout: InstructionLayout,
    ) -> Self {
        Self {
            ledger,
            dex_program_id,
            pool_init_marker,
            wrapped_sol_mint,
            layout,
            seen_signatures: HashSet::new(),
        }
    }

    /// `Ok(None)` covers every uninteresting event: no marker, duplicate
    /// signature, unavailable transaction, no matching instruction, or a
    /// wrapped-SOL base mint.
    pub async fn candidate_from(&mut self, event: &LogsEvent) -> Result<Option<PoolCandidate>> {
        if !event
            .logs
            .iter()
            .any(|line| line.contains(&self.pool_init_marker))
        {
            return Ok(None);
        }
        if self.seen_signatures.len() >= SEEN_SIGNATURES_CAP {
            self.seen_signatures.clear();
        }
        if !self.seen_signatures.insert(event.signature.clone()) {
            debug!(signature = %event.signature, "duplicate notification");
            return Ok(None);
        }

        let Some(envelope) = self.ledger.transaction_envelope(&event.signature).await? else {
            debug!(signature = %event.signature, "transaction unavailable");
            return Ok(None);
        };
        let Some((mint, pool)) = extract_candidate(&envelope, &self.dex_program_id, self.layout)
        else {
            debug!(signature = %event.signature, "no pool-init instruction in transaction");
            return Ok(None);
        };
        if mint == self.wrapped_sol_mint {
            debug!(%pool, "quote-side mint in base position, skipping");
            return Ok(None);
        }

        info!(%mint, %pool, signature = %event.signature, "new pool candidate");
        Ok(Some(PoolCandidate::new(mint, pool)))
    }
}

pub struct PoolWatcher {
    events: mpsc::Receiver<LogsEvent>,
    intake: CandidateIntake,
    pipeline: Arc<EvaluationPipeline>,
    startup_delay: Duration,
}

impl PoolWatcher {
    pub fn new(
        events: mpsc::Receiver<LogsEvent>,
        intake: CandidateIntake,
        pipeline: Arc<EvaluationPipeline>,
        startup_delay: Duration,
    ) -> Self {
        Self {
            events,
            intake,
            pipeline,
            startup_delay,
        }
    }

    pub async fn run(mut self) {
        info!("pool watcher running");
        while let Some(event) = self.events.recv().await {
            match self.intake.candidate_from(&event).await {
                Ok(Some(candidate)) => self.spawn_evaluation(candidate),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "log event handling failed"),
            }
        }
        info!("event channel closed, pool watcher stopping");
    }

    fn spawn_evaluation(&self, candidate: PoolCandidate) {
        let pipeline = Arc::clone(&self.pipeline);
        let delay = self.startup_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match pipeline.process_discovery(candidate).await {
                Ok(outcome) => {
                    debug!(mint = %outcome.candidate.mint, verdict = ?outcome.verdict, "evaluation finished");
                }
                Err(CheckError::InFlight { mint }) => {
                    debug!(%mint, "evaluation already running");
                }
                Err(e) => {
                    error!(error = %e, "evaluation failed");
                }
            }
        });
    }
}
