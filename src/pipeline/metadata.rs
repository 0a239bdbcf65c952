//! Metadata checker.
//!
//! Reads the token-metadata PDA for a mint, parses the fixed on-chain layout,
//! validates it structurally, and enriches social links from the off-chain
//! JSON document at the declared URI. Every failure in here degrades to a
//! safe default; this checker never aborts an evaluation. Gating on
//! mutability happens later in the decision engine, not here.

use crate::pipeline::ledger::LedgerReader;
use crate::types::MetadataReport;
use anyhow::{anyhow, Context, Result};
use moka::future::Cache;
use reqwest::{Client, Url};
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const METADATA_PDA_SEED: &[u8] = b"metadata";
const MAX_SELLER_FEE_BASIS_POINTS: u16 = 10_000;
const DOC_CACHE_CAPACITY: u64 = 1_000;
const DOC_CACHE_TTL: Duration = Duration::from_secs(300);

/// On-chain token-metadata record, fields in layout order.
#[derive(Debug, Clone)]
pub struct OnChainMetadata {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub seller_fee_basis_points: u16,
    pub creators: Option<Vec<Creator>>,
    pub is_mutable: bool,
}

#[derive(Debug, Clone)]
pub struct Creator {
    pub address: Pubkey,
    pub verified: bool,
    pub share: u8,
}

/// Off-chain JSON document at the metadata URI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OffchainDoc {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, rename = "createdOn")]
    pub created_on: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub telegram: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub extensions: Option<OffchainExtensions>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OffchainExtensions {
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub telegram: Option<String>,
}

/// Little-endian cursor over a raw account buffer.
struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or_else(|| anyhow!("metadata cursor overflow"))?;
        if end > self.data.len() {
            return Err(anyhow!(
                "metadata record truncated at byte {} (need {})",
                self.data.len(),
                end
            ));
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into()?))
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into()?))
    }

    fn read_pubkey(&mut self) -> Result<Pubkey> {
        Ok(Pubkey::try_from(self.take(32)?)?)
    }

    /// Length-prefixed string, fixed-capacity padded with NULs on chain.
    fn read_string(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        let raw = self.take(len)?;
        let text = String::from_utf8_lossy(raw);
        Ok(text.trim_end_matches('\0').trim().to_string())
    }
}

/// Parse a token-metadata account at its fixed layout.
pub fn parse_metadata_account(data: &[u8]) -> Result<OnChainMetadata> {
    let mut cursor = ByteCursor::new(data);
    let _key = cursor.read_u8()?;
    let _update_authority = cursor.read_pubkey()?;
    let _mint = cursor.read_pubkey()?;
    let name = cursor.read_string()?;
    let symbol = cursor.read_string()?;
    let uri = cursor.read_string()?;
    let seller_fee_basis_points = cursor.read_u16()?;

    let creators = if cursor.read_u8()? == 1 {
        let count = cursor.read_u32()? as usize;
        let mut creators = Vec::with_capacity(count);
        for _ in 0..count {
            let address = cursor.read_pubkey()?;
            let verified = cursor.read_u8()? == 1;
            let share = cursor.read_u8()?;
            creators.push(Creator {
                address,
                verified,
                share,
            });
        }
        Some(creators)
    } else {
        None
    };

    let _primary_sale_happened = cursor.read_u8()?;
    let is_mutable = cursor.read_u8()? == 1;

    Ok(OnChainMetadata {
        name,
        symbol,
        uri,
        seller_fee_basis_points,
        creators,
        is_mutable,
    })
}

/// Structural validation of the on-chain record.
pub fn validate_metadata(record: &OnChainMetadata) -> bool {
    if record.name.is_empty() || record.symbol.is_empty() {
        return false;
    }
    if Url::parse(&record.uri).is_err() {
        return false;
    }
    if record.seller_fee_basis_points > MAX_SELLER_FEE_BASIS_POINTS {
        return false;
    }
    if let Some(creators) = &record.creators {
        for creator in creators {
            if !creator.verified || creator.share > 100 {
                return false;
            }
        }
    }
    true
}

pub struct MetadataChecker {
    ledger: Arc<dyn LedgerReader>,
    http: Client,
    doc_cache: Cache<String, OffchainDoc>,
    metadata_program: Pubkey,
    fair_launch_origin: String,
    fetch_timeout: Duration,
}

impl MetadataChecker {
    pub fn new(
        ledger: Arc<dyn LedgerReader>,
        http: Client,
        metadata_program: Pubkey,
        fair_launch_origin: String,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            ledger,
            http,
            doc_cache: Cache::builder()
                .max_capacity(DOC_CACHE_CAPACITY)
                .time_to_live(DOC_CACHE_TTL)
                .build(),
            metadata_program,
            fair_launch_origin,
            fetch_timeout,
        }
    }

    /// Run the metadata check for one mint. Soft failures degrade to an
    /// empty, invalid report.
    pub async fn check(&self, mint: &Pubkey) -> MetadataReport {
        let record = match self.fetch_on_chain_record(mint).await {
            Ok(record) => record,
            Err(e) => {
                warn!(%mint, error = %e, "metadata record unavailable, degrading");
                return MetadataReport::default();
            }
        };

        let mut report = MetadataReport {
            name: record.name.clone(),
            symbol: record.symbol.clone(),
            is_mutable: record.is_mutable,
            is_valid: validate_metadata(&record),
            ..MetadataReport::default()
        };

        match self.ledger.mint_info(mint).await {
            Ok(info) => {
                report.is_mintable = info.has_mint_authority;
                report.is_freezable = info.has_freeze_authority;
            }
            Err(e) => warn!(%mint, error = %e, "mint account unavailable for metadata check"),
        }

        let doc = self.fetch_offchain_doc(&record.uri).await;
        if let Some(doc) = doc {
            report.description = doc.description.clone().unwrap_or_default();
            report.image_url = doc.image.clone().unwrap_or_default();
            report.telegram = doc.telegram.clone().unwrap_or_default();
            report.twitter = doc.twitter.clone().unwrap_or_default();
            report.website = doc.website.clone().unwrap_or_default();
            report.is_pump_fun_origin =
                doc.created_on.as_deref() == Some(self.fair_launch_origin.as_str());

            if !report.is_pump_fun_origin && report.has_social_links() {
                apply_extended_links(&mut report, &doc);
            }
        }

        report
    }

    async fn fetch_on_chain_record(&self, mint: &Pubkey) -> Result<OnChainMetadata> {
        let (pda, _bump) = Pubkey::find_program_address(
            &[
                METADATA_PDA_SEED,
                self.metadata_program.as_ref(),
                mint.as_ref(),
            ],
            &self.metadata_program,
        );
        let data = self
            .ledger
            .account_data(&pda)
            .await
            .context("metadata PDA fetch failed")?;
        parse_metadata_account(&data)
    }

    /// Secondary lookup: the off-chain JSON document at the declared URI,
    /// cached per-uri. Failures return `None` and the caller keeps the
    /// on-chain values.
    async fn fetch_offchain_doc(&self, uri: &str) -> Option<OffchainDoc> {
        if uri.is_empty() || Url::parse(uri).is_err() {
            return None;
        }
        if let Some(doc) = self.doc_cache.get(uri).await {
            debug!(uri, "off-chain metadata cache hit");
            return Some(doc);
        }
        match self.request_doc(uri).await {
            Ok(doc) => {
                self.doc_cache.insert(uri.to_string(), doc.clone()).await;
                Some(doc)
            }
            Err(e) => {
                warn!(uri, error = %e, "off-chain metadata fetch failed, keeping on-chain values");
                None
            }
        }
    }

    async fn request_doc(&self, uri: &str) -> Result<OffchainDoc> {
        let response = self
            .http
            .get(uri)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .context("off-chain metadata request failed")?;
        if !response.status().is_success() {
            return Err(anyhow!("off-chain metadata status {}", response.status()));
        }
        response
            .json::<OffchainDoc>()
            .await
            .context("off-chain metadata is not valid JSON")
    }
}

/// Override social links from `extensions`, validating the website as a URL
/// before accepting it.
fn apply_extended_links(report: &mut MetadataReport, doc: &OffchainDoc) {
    let Some(extensions) = &doc.extensions else {
        return;
    };
    if let Some(website) = &extensions.website {
        if Url::parse(website).is_ok() {
            report.website = website.clone();
        }
    }
    if let Some(twitter) = &extensions.twitter {
        if !twitter.is_empty() {
            report.twitter = twitter.clone();
        }
    }
    if let Some(telegram) = &extensions.telegram {
        if !telegram.is_empty() {
            report.telegram = telegram.clone();
        }
    }
}
