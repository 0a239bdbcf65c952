//! Checker error taxonomy.
//!
//! Soft failures never surface here: the metadata and liquidity checkers
//! degrade to safe defaults internally. This type exists for the one fatal
//! case plus opaque wrapping of everything else.

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckError {
    /// The holders checker found no holders or a non-positive supply. Fatal
    /// for the whole evaluation of that candidate; not retried.
    #[error("no holders found for mint {mint}")]
    NoHolders { mint: Pubkey },

    /// Another evaluation of the same mint is already running. The caller
    /// skips the duplicate rather than queueing it.
    #[error("evaluation already in flight for mint {mint}")]
    InFlight { mint: Pubkey },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
