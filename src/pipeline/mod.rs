//! Token risk evaluation pipeline.
//!
//! Flow: the listener turns log notifications into `(mint, pool)` candidates,
//! the engine fans out to the three checkers and the reputation service, and
//! the lifecycle manager rechecks and expires whatever the engine stored.

pub mod alert;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod holders;
pub mod ledger;
pub mod lifecycle;
pub mod listener;
pub mod liquidity;
pub mod marketdata;
pub mod metadata;
pub mod price;
pub mod reputation;
pub mod storage;

pub use alert::{format_alert_message, AlertKind, Notifier, TelegramNotifier, TokenAlert};
pub use decoder::extract_candidate;
pub use engine::{classify, pre_screen, EvaluationPipeline};
pub use error::CheckError;
pub use holders::HoldersChecker;
pub use ledger::{LedgerReader, RpcLedgerReader};
pub use lifecycle::{classify_age, AgeBand, LifecycleManager};
pub use listener::{run_log_subscription, CandidateIntake, PoolWatcher};
pub use liquidity::LiquidityChecker;
pub use marketdata::{deepest_pair, format_market_lines, MarketdataClient};
pub use metadata::MetadataChecker;
pub use price::{PriceCache, PriceRefresher};
pub use reputation::{ReputationApi, ReputationClient};
pub use storage::{CandidateStore, SqliteCandidateStore};
