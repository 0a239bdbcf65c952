//! Reputation service client.
//!
//! Wraps the external risk-report API behind a trait so the decision engine
//! can be exercised without the network. The client is rate limited and
//! fails open: any transport, status or decode failure yields the sentinel
//! "unavailable" report (score -1) instead of an error.

use crate::types::ReputationReport;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use solana_sdk::pubkey::Pubkey;
use std::num::NonZeroU32;
use tracing::{debug, warn};

#[async_trait]
pub trait ReputationApi: Send + Sync {
    /// Risk summary for a mint. Infallible by contract; failures are folded
    /// into [`ReputationReport::unavailable`].
    async fn report(&self, mint: &Pubkey) -> ReputationReport;
}

pub struct ReputationClient {
    http: Client,
    base_url: String,
    limiter: DefaultDirectRateLimiter,
}

impl ReputationClient {
    pub fn new(http: Client, base_url: String, requests_per_second: u32) -> Self {
        let quota = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            http,
            base_url,
            limiter: RateLimiter::direct(Quota::per_second(quota)),
        }
    }

    async fn fetch(&self, mint: &Pubkey) -> anyhow::Result<ReputationReport> {
        self.limiter.until_ready().await;
        let url = format!("{}/tokens/{mint}/report/summary", self.base_url);
        let response = self.http.get(&url).send().await?.error_for_status()?;
        Ok(response.json::<ReputationReport>().await?)
    }
}

#[async_trait]
impl ReputationApi for ReputationClient {
    async fn report(&self, mint: &Pubkey) -> ReputationReport {
        match self.fetch(mint).await {
            Ok(report) => {
                debug!(%mint, score = report.score, risks = report.risks.len(), "reputation report");
                report
            }
            Err(e) => {
                warn!(%mint, error = %e, "reputation lookup failed, treating as unavailable");
                ReputationReport::unavailable()
            }
        }
    }
}
