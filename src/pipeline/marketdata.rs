//! Market-data lookups for alert enrichment.
//!
//! Pulls pair statistics (price, volume, transaction counts) from the public
//! aggregator API. This data never participates in a verdict; a failed lookup
//! just leaves the alert without market figures.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRef {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TxnCount {
    #[serde(default)]
    pub buys: u64,
    #[serde(default)]
    pub sells: u64,
}

/// Per-window transaction counts keyed by the aggregator's window names.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TxnWindows {
    #[serde(default)]
    pub m5: TxnCount,
    #[serde(default)]
    pub h1: TxnCount,
    #[serde(default)]
    pub h6: TxnCount,
    #[serde(default)]
    pub h24: TxnCount,
}

/// Per-window figures (volume, price change).
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct FloatWindows {
    #[serde(default)]
    pub m5: f64,
    #[serde(default)]
    pub h1: f64,
    #[serde(default)]
    pub h6: f64,
    #[serde(default)]
    pub h24: f64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PairLiquidity {
    #[serde(default)]
    pub usd: f64,
    #[serde(default)]
    pub base: f64,
    #[serde(default)]
    pub quote: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairSnapshot {
    #[serde(default)]
    pub dex_id: String,
    #[serde(default)]
    pub pair_address: String,
    #[serde(default)]
    pub base_token: TokenRef,
    #[serde(default)]
    pub quote_token: TokenRef,
    #[serde(default)]
    pub price_native: String,
    #[serde(default)]
    pub price_usd: String,
    #[serde(default)]
    pub txns: TxnWindows,
    #[serde(default)]
    pub volume: FloatWindows,
    #[serde(default)]
    pub price_change: FloatWindows,
    #[serde(default)]
    pub liquidity: PairLiquidity,
    #[serde(default)]
    pub fdv: f64,
    #[serde(default)]
    pub pair_created_at: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TokenPairsResponse {
    #[serde(default)]
    pairs: Option<Vec<PairSnapshot>>,
}

/// Pick the pair with the most USD liquidity.
pub fn deepest_pair(pairs: Vec<PairSnapshot>) -> Option<PairSnapshot> {
    pairs
        .into_iter()
        .max_by(|a, b| a.liquidity.usd.total_cmp(&b.liquidity.usd))
}

/// Render the pair statistics appended to an alert message.
pub fn format_market_lines(pair: &PairSnapshot) -> String {
    format!(
        "Volume 24h: ${:.2}\nTxns 1h: {} buys / {} sells\nPrice change 1h: {:.1}%",
        pair.volume.h24, pair.txns.h1.buys, pair.txns.h1.sells, pair.price_change.h1
    )
}

pub struct MarketdataClient {
    http: Client,
    base_url: String,
}

impl MarketdataClient {
    pub fn new(http: Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Deepest pair trading the mint, if the aggregator knows it yet.
    pub async fn best_pair(&self, mint: &Pubkey) -> Result<Option<PairSnapshot>> {
        let url = format!("{}/latest/dex/tokens/{mint}", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("market-data request failed")?
            .error_for_status()
            .context("market-data request rejected")?
            .json::<TokenPairsResponse>()
            .await
            .context("market-data response is not JSON")?;

        let best = deepest_pair(response.pairs.unwrap_or_default());
        if best.is_none() {
            debug!(%mint, "no pairs listed yet");
        }
        Ok(best)
    }
}
