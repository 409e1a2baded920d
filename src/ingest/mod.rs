//! Ingestion pipeline: normalization, deduplication, staleness and the run orchestrator.

pub mod dedup;
mod error;
pub mod normalize;
pub mod orchestrator;
pub mod sweeper;

pub use dedup::{DedupDecision, Deduplicator};
pub use error::IngestError;
pub use normalize::{normalize_posting, NormalizedJob};
pub use orchestrator::{Orchestrator, PipelineConfig, RunSummary};
pub use sweeper::{count_stale, sweep_stale, DEFAULT_STALE_AFTER_DAYS};
