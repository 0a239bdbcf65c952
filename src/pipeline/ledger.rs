//! Read-only ledger access seam.
//!
//! The checkers never talk to an RPC client directly; they go through
//! [`LedgerReader`] so the whole evaluation path can run against a mock in
//! tests. The production implementation wraps the nonblocking Solana RPC
//! client.

use crate::types::TransactionEnvelope;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_transaction_status::UiTransactionEncoding;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// SPL mint layout constants: COption tag + supply + decimals + freeze tag.
const MINT_SUPPLY_OFFSET: usize = 36;
const MINT_DECIMALS_OFFSET: usize = 44;
const MINT_FREEZE_TAG_OFFSET: usize = 46;
const MINT_ACCOUNT_LEN: usize = 82;

/// SPL token-account layout: mint at 0, owner at 32.
const TOKEN_ACCOUNT_OWNER_OFFSET: usize = 32;
const TOKEN_ACCOUNT_LEN: usize = 165;

/// Parsed SPL mint state.
#[derive(Debug, Clone, Copy)]
pub struct MintInfo {
    pub supply: u64,
    pub decimals: u8,
    pub has_mint_authority: bool,
    pub has_freeze_authority: bool,
}

/// Raw token supply with decimals.
#[derive(Debug, Clone, Copy)]
pub struct TokenAmount {
    pub amount: u64,
    pub decimals: u8,
}

/// One of the largest token accounts for a mint.
#[derive(Debug, Clone)]
pub struct TokenHolding {
    /// The token account (not the owning wallet).
    pub address: Pubkey,
    pub amount: u64,
    pub decimals: u8,
}

/// Narrow read interface over the ledger.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Raw account bytes.
    async fn account_data(&self, account: &Pubkey) -> Result<Vec<u8>>;

    /// Parsed SPL mint state for a mint account.
    async fn mint_info(&self, mint: &Pubkey) -> Result<MintInfo>;

    /// Total supply of a mint in base units.
    async fn token_supply(&self, mint: &Pubkey) -> Result<TokenAmount>;

    /// The largest token accounts holding a mint, ordered descending.
    async fn token_largest_accounts(&self, mint: &Pubkey) -> Result<Vec<TokenHolding>>;

    /// UI-normalized balance of one token account.
    async fn token_account_balance(&self, account: &Pubkey) -> Result<f64>;

    /// Owning wallet of a token account, if the account exists and parses.
    async fn token_account_owner(&self, account: &Pubkey) -> Result<Option<Pubkey>>;

    /// Fetch a confirmed transaction by signature as a decode-ready envelope.
    async fn transaction_envelope(&self, signature: &str) -> Result<Option<TransactionEnvelope>>;
}

/// Parse an SPL mint account at fixed offsets.
pub fn parse_mint_account(data: &[u8]) -> Result<MintInfo> {
    if data.len() < MINT_ACCOUNT_LEN {
        return Err(anyhow!("mint account too short: {} bytes", data.len()));
    }
    let mint_tag = u32::from_le_bytes(data[0..4].try_into()?);
    let supply = u64::from_le_bytes(
        data[MINT_SUPPLY_OFFSET..MINT_SUPPLY_OFFSET + 8]
            .try_into()
            .context("invalid supply bytes")?,
    );
    let decimals = data[MINT_DECIMALS_OFFSET];
    let freeze_tag = u32::from_le_bytes(
        data[MINT_FREEZE_TAG_OFFSET..MINT_FREEZE_TAG_OFFSET + 4].try_into()?,
    );
    Ok(MintInfo {
        supply,
        decimals,
        has_mint_authority: mint_tag == 1,
        has_freeze_authority: freeze_tag == 1,
    })
}

/// Extract the owner wallet from an SPL token account at fixed offsets.
pub fn parse_token_account_owner(data: &[u8]) -> Option<Pubkey> {
    if data.len() < TOKEN_ACCOUNT_LEN {
        return None;
    }
    Pubkey::try_from(&data[TOKEN_ACCOUNT_OWNER_OFFSET..TOKEN_ACCOUNT_OWNER_OFFSET + 32]).ok()
}

/// Production ledger reader over the nonblocking RPC client.
pub struct RpcLedgerReader {
    rpc: RpcClient,
}

impl RpcLedgerReader {
    pub fn new(rpc_url: String, timeout: Duration) -> Self {
        Self {
            rpc: RpcClient::new_with_timeout(rpc_url, timeout),
        }
    }
}

#[async_trait]
impl LedgerReader for RpcLedgerReader {
    async fn account_data(&self, account: &Pubkey) -> Result<Vec<u8>> {
        self.rpc
            .get_account_data(account)
            .await
            .with_context(|| format!("failed to fetch account {account}"))
    }

    async fn mint_info(&self, mint: &Pubkey) -> Result<MintInfo> {
        let data = self.account_data(mint).await?;
        parse_mint_account(&data)
    }

    async fn token_supply(&self, mint: &Pubkey) -> Result<TokenAmount> {
        let supply = self
            .rpc
            .get_token_supply(mint)
            .await
            .with_context(|| format!("failed to fetch supply for {mint}"))?;
        Ok(TokenAmount {
            amount: supply
                .amount
                .parse::<u64>()
                .context("unparseable supply amount")?,
            decimals: supply.decimals,
        })
    }

    async fn token_largest_accounts(&self, mint: &Pubkey) -> Result<Vec<TokenHolding>> {
        let accounts = self
            .rpc
            .get_token_largest_accounts(mint)
            .await
            .with_context(|| format!("failed to fetch largest accounts for {mint}"))?;

        let mut holdings = Vec::with_capacity(accounts.len());
        for account in accounts {
            let address = Pubkey::from_str(&account.address)
                .context("unparseable token account address")?;
            let amount = account
                .amount
                .amount
                .parse::<u64>()
                .context("unparseable holding amount")?;
            holdings.push(TokenHolding {
                address,
                amount,
                decimals: account.amount.decimals,
            });
        }
        Ok(holdings)
    }

    async fn token_account_balance(&self, account: &Pubkey) -> Result<f64> {
        let balance = self
            .rpc
            .get_token_account_balance(account)
            .await
            .with_context(|| format!("failed to fetch balance of {account}"))?;
        Ok(balance.ui_amount.unwrap_or(0.0))
    }

    async fn token_account_owner(&self, account: &Pubkey) -> Result<Option<Pubkey>> {
        let data = self.account_data(account).await?;
        Ok(parse_token_account_owner(&data))
    }

    async fn transaction_envelope(&self, signature: &str) -> Result<Option<TransactionEnvelope>> {
        let signature = Signature::from_str(signature).context("unparseable signature")?;
        let fetched = self
            .rpc
            .get_transaction_with_config(
                &signature,
                RpcTransactionConfig {
                    encoding: Some(UiTransactionEncoding::Base64),
                    commitment: Some(CommitmentConfig::confirmed()),
                    max_supported_transaction_version: Some(0),
                },
            )
            .await
            .with_context(|| format!("failed to fetch transaction {signature}"))?;

        let decoded = fetched.transaction.transaction.decode();
        if decoded.is_none() {
            debug!(%signature, "transaction did not decode");
        }
        Ok(decoded.map(|tx| TransactionEnvelope::from_versioned(&tx)))
    }
}
