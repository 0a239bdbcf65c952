//! Pool Sentinel: watches a DEX program for pool creations and evaluates
//! every new token through a multi-factor risk pipeline before alerting.
//!
//! The library exposes the pipeline pieces individually so the binary (and
//! tests) can wire them with real or mock collaborators.

pub mod config;
pub mod pipeline;
pub mod types;

pub use config::{InstructionLayout, PipelineConfig};
pub use pipeline::{EvaluationPipeline, LifecycleManager, PoolWatcher, PriceCache};
pub use types::{PoolCandidate, RejectReason, Verdict};
