//! Holder-concentration checker.
//!
//! Partitions the supply held by the largest token accounts into the whale
//! list and the pool custody share. An empty holder list or non-positive
//! supply is fatal for the candidate's whole evaluation.

use crate::pipeline::error::CheckError;
use crate::pipeline::ledger::LedgerReader;
use crate::types::{HoldersReport, TopHolder};
use anyhow::Context;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct HoldersChecker {
    ledger: Arc<dyn LedgerReader>,
    pool_custody_wallet: Pubkey,
}

impl HoldersChecker {
    pub fn new(ledger: Arc<dyn LedgerReader>, pool_custody_wallet: Pubkey) -> Self {
        Self {
            ledger,
            pool_custody_wallet,
        }
    }

    pub async fn check(&self, mint: &Pubkey) -> Result<HoldersReport, CheckError> {
        let supply = self
            .ledger
            .token_supply(mint)
            .await
            .context("holder check could not read supply")?;
        let holdings = self
            .ledger
            .token_largest_accounts(mint)
            .await
            .context("holder check could not read largest accounts")?;

        if holdings.is_empty() || supply.amount == 0 {
            return Err(CheckError::NoHolders { mint: *mint });
        }

        let total_supply = supply.amount as f64;
        let mut whale_amount: u64 = 0;
        let mut custody_amount: u64 = 0;
        let mut top_holders = Vec::new();

        for holding in &holdings {
            let owner = match self.ledger.token_account_owner(&holding.address).await {
                Ok(owner) => owner,
                Err(e) => {
                    warn!(account = %holding.address, error = %e, "holder owner lookup failed");
                    None
                }
            };
            match owner {
                Some(wallet) if wallet == self.pool_custody_wallet => {
                    custody_amount = custody_amount.saturating_add(holding.amount);
                }
                Some(wallet) => {
                    whale_amount = whale_amount.saturating_add(holding.amount);
                    top_holders.push(TopHolder {
                        address: wallet,
                        amount: holding.amount,
                        percentage: holding.amount as f64 / total_supply * 100.0,
                    });
                }
                None => {
                    debug!(account = %holding.address, "holder account did not resolve to a wallet");
                }
            }
        }

        Ok(HoldersReport {
            top_holders,
            top_holders_percentage: whale_amount as f64 / total_supply * 100.0,
            raydium_pool_percentage: custody_amount as f64 / total_supply * 100.0,
        })
    }
}
