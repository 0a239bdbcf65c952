//! Liquidity checker over the AMM v4 pool account.
//!
//! Decodes the pool state at fixed byte offsets, reads the two vault balances
//! and the LP mint, and derives USD depth plus the burnt-LP lock estimate.
//! Every failure degrades to a report with `has_liquidity = false`; this
//! checker never aborts an evaluation on its own.

use crate::pipeline::ledger::LedgerReader;
use crate::pipeline::price::PriceCache;
use crate::types::LiquidityReport;
use anyhow::{anyhow, Context, Result};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tracing::{debug, warn};

/// AMM v4 state layout: vault and mint pubkeys, plus the LP reserve counter.
const BASE_VAULT_OFFSET: usize = 336;
const QUOTE_VAULT_OFFSET: usize = 368;
const LP_MINT_OFFSET: usize = 464;
const LP_RESERVE_OFFSET: usize = 720;
const AMM_STATE_LEN: usize = 752;

/// The slice of AMM v4 state the checker needs.
#[derive(Debug, Clone, Copy)]
pub struct AmmPoolState {
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub lp_mint: Pubkey,
    /// Cumulative LP tokens ever minted, in base units.
    pub lp_reserve_raw: u64,
}

/// Decode the fields above from a raw AMM v4 account.
pub fn parse_pool_state(data: &[u8]) -> Result<AmmPoolState> {
    if data.len() < AMM_STATE_LEN {
        return Err(anyhow!("pool account too short: {} bytes", data.len()));
    }
    let pubkey_at = |offset: usize| -> Result<Pubkey> {
        Pubkey::try_from(&data[offset..offset + 32])
            .map_err(|_| anyhow!("invalid pubkey at offset {offset}"))
    };
    Ok(AmmPoolState {
        base_vault: pubkey_at(BASE_VAULT_OFFSET)?,
        quote_vault: pubkey_at(QUOTE_VAULT_OFFSET)?,
        lp_mint: pubkey_at(LP_MINT_OFFSET)?,
        lp_reserve_raw: u64::from_le_bytes(
            data[LP_RESERVE_OFFSET..LP_RESERVE_OFFSET + 8]
                .try_into()
                .context("invalid lp reserve bytes")?,
        ),
    })
}

/// Share of LP tokens burnt out of everything ever minted.
pub fn burnt_percentage(lp_reserve: f64, actual_supply: f64) -> f64 {
    if lp_reserve <= 0.0 {
        return 0.0;
    }
    let burnt = (lp_reserve - actual_supply).max(0.0);
    burnt / lp_reserve * 100.0
}

pub struct LiquidityChecker {
    ledger: Arc<dyn LedgerReader>,
    price: PriceCache,
    /// Strict threshold: a burnt share above this counts as locked.
    burnt_locked_threshold: f64,
}

impl LiquidityChecker {
    pub fn new(ledger: Arc<dyn LedgerReader>, price: PriceCache, burnt_locked_threshold: f64) -> Self {
        Self {
            ledger,
            price,
            burnt_locked_threshold,
        }
    }

    pub async fn check(&self, pool: &Pubkey) -> LiquidityReport {
        match self.try_check(pool).await {
            Ok(report) => report,
            Err(e) => {
                warn!(%pool, error = %e, "liquidity check degraded to no-liquidity");
                LiquidityReport::default()
            }
        }
    }

    async fn try_check(&self, pool: &Pubkey) -> Result<LiquidityReport> {
        let data = self
            .ledger
            .account_data(pool)
            .await
            .context("pool account fetch failed")?;
        let state = parse_pool_state(&data)?;

        let base_amount = self
            .ledger
            .token_account_balance(&state.base_vault)
            .await
            .context("base vault balance fetch failed")?;
        let quote_amount = self
            .ledger
            .token_account_balance(&state.quote_vault)
            .await
            .context("quote vault balance fetch failed")?;

        let quote = self
            .price
            .latest()
            .await
            .context("quote-asset price not available yet")?;

        let quote_liquidity_usd = quote.price_usd * quote_amount;
        let base_token_price_usd = if base_amount > 0.0 {
            quote_liquidity_usd / base_amount
        } else {
            0.0
        };
        // Both sides of the pool are worth the same by construction.
        let total_liquidity_usd = quote_liquidity_usd * 2.0;

        let lp_mint = self
            .ledger
            .mint_info(&state.lp_mint)
            .await
            .context("lp mint fetch failed")?;
        let scale = 10f64.powi(i32::from(lp_mint.decimals));
        let lp_reserve = state.lp_reserve_raw as f64 / scale;
        let actual_supply = lp_mint.supply as f64 / scale;
        let burnt = burnt_percentage(lp_reserve, actual_supply);

        debug!(
            %pool,
            total_liquidity_usd,
            burnt_pct = burnt,
            "liquidity snapshot"
        );

        Ok(LiquidityReport {
            has_liquidity: lp_reserve > 0.0,
            is_liquidity_locked: burnt > self.burnt_locked_threshold,
            burnt_percentage: burnt,
            lp_reserve,
            total_liquidity_usd,
            base_token_price_usd,
            pool_address: Some(*pool),
        })
    }
}
