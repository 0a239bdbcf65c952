//! Shared quote-asset price cell and its refresher task.
//!
//! The cell has exactly one writer (the refresher) and any number of
//! stale-tolerant readers. The last successfully fetched quote stays
//! available if a refresh fails; `as_of` makes staleness observable.

use crate::pipeline::storage::CandidateStore;
use crate::types::PriceQuote;
use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Cloneable handle to the single shared quote.
#[derive(Clone, Default)]
pub struct PriceCache {
    cell: Arc<RwLock<Option<PriceQuote>>>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn latest(&self) -> Option<PriceQuote> {
        *self.cell.read().await
    }

    /// Sole-writer update; called only by the refresher (and tests).
    pub async fn publish(&self, price_usd: f64) {
        let mut cell = self.cell.write().await;
        *cell = Some(PriceQuote {
            price_usd,
            as_of: Utc::now(),
        });
    }
}

/// Periodic price refresher. Fetches the quote-asset USD price, publishes it
/// to the cell and upserts the singleton `sol_price` row.
pub struct PriceRefresher {
    http: Client,
    cache: PriceCache,
    store: Arc<dyn CandidateStore>,
    price_api_url: String,
    interval: Duration,
}

impl PriceRefresher {
    pub fn new(
        http: Client,
        cache: PriceCache,
        store: Arc<dyn CandidateStore>,
        price_api_url: String,
        interval: Duration,
    ) -> Self {
        Self {
            http,
            cache,
            store,
            price_api_url,
            interval,
        }
    }

    /// One refresh pass; public so tests can drive ticks deterministically.
    /// Single attempt, no backoff: a failure leaves the previous quote.
    pub async fn refresh_once(&self) -> Result<f64> {
        let price = self.fetch_price().await?;
        self.cache.publish(price).await;
        if let Err(e) = self.store.upsert_sol_price(price).await {
            error!(error = %e, "sol price upsert failed");
        }
        debug!(price, "quote-asset price refreshed");
        Ok(price)
    }

    async fn fetch_price(&self) -> Result<f64> {
        let response = self
            .http
            .get(&self.price_api_url)
            .send()
            .await
            .context("price request failed")?
            .json::<serde_json::Value>()
            .await
            .context("price response is not JSON")?;
        response["solana"]["usd"]
            .as_f64()
            .context("price response missing solana.usd")
    }

    /// Timer-driven refresh loop.
    pub async fn run(self) {
        info!(interval_secs = self.interval.as_secs(), "price refresher running");
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.refresh_once().await {
                error!(error = %e, "price refresh failed, keeping last quote");
            }
        }
    }
}
