//! SQLite persistence for stored candidates and the quote-asset price row.
//!
//! Access goes through [`CandidateStore`] so the lifecycle manager and tests
//! can run against any backend. Timestamps are kept as UTC milliseconds and
//! risk flags as a JSON column.

use crate::types::{RiskFlag, StoredCandidate};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use solana_sdk::pubkey::Pubkey;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use tracing::info;

#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Persist an accepted candidate; returns the row id.
    async fn insert_candidate(&self, candidate: &StoredCandidate) -> Result<i64>;

    /// Every persisted candidate, oldest first.
    async fn all_candidates(&self) -> Result<Vec<StoredCandidate>>;

    async fn delete_candidate(&self, id: i64) -> Result<()>;

    /// Upsert the singleton quote-asset price row.
    async fn upsert_sol_price(&self, price_usd: f64) -> Result<()>;

    async fn sol_price(&self) -> Result<Option<f64>>;
}

#[derive(FromRow)]
struct CandidateRow {
    id: i64,
    dex: String,
    name: String,
    symbol: String,
    token_address: String,
    pool_address: String,
    price_usd: f64,
    liquidity_amount_usd: f64,
    telegram: String,
    website: String,
    twitter: String,
    risk: String,
    score: i64,
    created_at: i64,
}

impl CandidateRow {
    fn into_candidate(self) -> Result<StoredCandidate> {
        Ok(StoredCandidate {
            id: Some(self.id),
            dex: self.dex,
            name: self.name,
            symbol: self.symbol,
            mint: Pubkey::from_str(&self.token_address).context("bad mint in row")?,
            pool: Pubkey::from_str(&self.pool_address).context("bad pool in row")?,
            price_usd: self.price_usd,
            liquidity_usd: self.liquidity_amount_usd,
            telegram: self.telegram,
            website: self.website,
            twitter: self.twitter,
            risk_flags: serde_json::from_str::<Vec<RiskFlag>>(&self.risk)
                .context("bad risk json in row")?,
            score: self.score,
            created_at: DateTime::<Utc>::from_timestamp_millis(self.created_at)
                .ok_or_else(|| anyhow!("bad created_at in row"))?,
        })
    }
}

pub struct SqliteCandidateStore {
    pool: SqlitePool,
}

impl SqliteCandidateStore {
    /// Open (or create) the database and bootstrap the schema.
    pub async fn connect(database_url: &str) -> Result<Self> {
        // In-memory databases live per-connection; a pool of one keeps the
        // schema visible to every query.
        let max_connections = if database_url.contains("memory") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .with_context(|| format!("failed to open database {database_url}"))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS new_tokens (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                dex TEXT NOT NULL,
                name TEXT NOT NULL,
                symbol TEXT NOT NULL,
                token_address TEXT NOT NULL,
                pool_address TEXT NOT NULL,
                price_usd REAL NOT NULL,
                liquidity_amount_usd REAL NOT NULL,
                telegram TEXT NOT NULL DEFAULT '',
                website TEXT NOT NULL DEFAULT '',
                twitter TEXT NOT NULL DEFAULT '',
                risk TEXT NOT NULL DEFAULT '[]',
                score INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create new_tokens table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sol_price (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                price REAL NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create sol_price table")?;

        info!(database_url, "candidate store ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl CandidateStore for SqliteCandidateStore {
    async fn insert_candidate(&self, candidate: &StoredCandidate) -> Result<i64> {
        let risk = serde_json::to_string(&candidate.risk_flags)
            .context("failed to serialize risk flags")?;
        let result = sqlx::query(
            r#"
            INSERT INTO new_tokens
                (dex, name, symbol, token_address, pool_address, price_usd,
                 liquidity_amount_usd, telegram, website, twitter, risk, score, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&candidate.dex)
        .bind(&candidate.name)
        .bind(&candidate.symbol)
        .bind(candidate.mint.to_string())
        .bind(candidate.pool.to_string())
        .bind(candidate.price_usd)
        .bind(candidate.liquidity_usd)
        .bind(&candidate.telegram)
        .bind(&candidate.website)
        .bind(&candidate.twitter)
        .bind(risk)
        .bind(candidate.score)
        .bind(candidate.created_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .context("failed to insert candidate")?;
        Ok(result.last_insert_rowid())
    }

    async fn all_candidates(&self) -> Result<Vec<StoredCandidate>> {
        let rows = sqlx::query_as::<_, CandidateRow>(
            "SELECT * FROM new_tokens ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list candidates")?;
        rows.into_iter().map(CandidateRow::into_candidate).collect()
    }

    async fn delete_candidate(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM new_tokens WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete candidate {id}"))?;
        Ok(())
    }

    async fn upsert_sol_price(&self, price_usd: f64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sol_price (id, price) VALUES (1, ?)
            ON CONFLICT(id) DO UPDATE SET price = excluded.price
            "#,
        )
        .bind(price_usd)
        .execute(&self.pool)
        .await
        .context("failed to upsert sol price")?;
        Ok(())
    }

    async fn sol_price(&self) -> Result<Option<f64>> {
        let row: Option<(f64,)> = sqlx::query_as("SELECT price FROM sol_price WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .context("failed to read sol price")?;
        Ok(row.map(|(price,)| price))
    }
}
