//! Alert projection and Telegram delivery.
//!
//! Alerts are rendered to a plain multi-line message; delivery goes through
//! the [`Notifier`] seam. A failed delivery is logged by the caller and never
//! affects a verdict or the candidate lifecycle.

use crate::types::{EvaluationOutcome, RiskFlag};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

/// What prompted the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// First-pass evaluation finished in the alert-only branch.
    Discovery,
    /// A stored candidate survived its recheck window.
    Graduation,
}

/// Everything the message template needs, detached from live report types.
#[derive(Debug, Clone)]
pub struct TokenAlert {
    pub kind: AlertKind,
    pub dex: String,
    pub name: String,
    pub symbol: String,
    pub mint: String,
    pub price_usd: f64,
    pub liquidity_usd: f64,
    pub telegram: String,
    pub website: String,
    pub twitter: String,
    pub risk_flags: Vec<RiskFlag>,
    pub score: i64,
}

impl TokenAlert {
    /// Project an evaluation outcome into the message template. Graduation
    /// alerts come through here too, from the fresh recheck outcome, so the
    /// reader always sees current price, liquidity and score.
    pub fn from_outcome(kind: AlertKind, dex: &str, outcome: &EvaluationOutcome) -> Self {
        let score = outcome
            .reputation
            .as_ref()
            .map(|report| report.score)
            .unwrap_or(-1);
        let risk_flags = outcome
            .reputation
            .as_ref()
            .map(|report| report.risks.clone())
            .unwrap_or_default();
        Self {
            kind,
            dex: dex.to_string(),
            name: outcome.metadata.name.clone(),
            symbol: outcome.metadata.symbol.clone(),
            mint: outcome.candidate.mint.to_string(),
            price_usd: outcome.liquidity.base_token_price_usd,
            liquidity_usd: outcome.liquidity.total_liquidity_usd,
            telegram: outcome.metadata.telegram.clone(),
            website: outcome.metadata.website.clone(),
            twitter: outcome.metadata.twitter.clone(),
            risk_flags,
            score,
        }
    }
}

/// Render the alert to the message posted to the channel.
pub fn format_alert_message(alert: &TokenAlert) -> String {
    let header = match alert.kind {
        AlertKind::Discovery => "New token detected",
        AlertKind::Graduation => "Token held up after recheck",
    };
    let mut lines = vec![
        header.to_string(),
        format!("DEX: {}", alert.dex),
        format!("Name: {}", alert.name),
        format!("Symbol: {}", alert.symbol),
        format!("Address: {}", alert.mint),
        format!("Price: ${:.10}", alert.price_usd),
        format!("Liquidity: ${:.2}", alert.liquidity_usd),
    ];
    if !alert.telegram.is_empty() {
        lines.push(format!("Telegram: {}", alert.telegram));
    }
    if !alert.website.is_empty() {
        lines.push(format!("Website: {}", alert.website));
    }
    if !alert.twitter.is_empty() {
        lines.push(format!("Twitter: {}", alert.twitter));
    }
    lines.push(format!("Score: {}", alert.score));
    if !alert.risk_flags.is_empty() {
        lines.push("Risks:".to_string());
        for flag in &alert.risk_flags {
            if flag.level.is_empty() {
                lines.push(format!("- {}", flag.name));
            } else {
                lines.push(format!("- {} ({})", flag.name, flag.level));
            }
        }
    }
    lines.join("\n")
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<()>;
}

/// Telegram bot-API notifier posting to a channel.
pub struct TelegramNotifier {
    http: Client,
    bot_token: String,
    channel: String,
}

impl TelegramNotifier {
    pub fn new(http: Client, bot_token: String, channel: String) -> Self {
        Self {
            http,
            bot_token,
            channel,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        self.http
            .post(&url)
            .json(&json!({
                "chat_id": self.channel,
                "text": message,
                "disable_web_page_preview": true,
            }))
            .send()
            .await
            .context("telegram request failed")?
            .error_for_status()
            .context("telegram rejected the message")?;
        debug!(channel = %self.channel, "alert delivered");
        Ok(())
    }
}
