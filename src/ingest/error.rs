//! Errors raised by the ingestion pipeline.

use std::time::Duration;

use thiserror::Error;

use crate::scrapers::{ExtractError, FetchError};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("a scraper run is already in progress")]
    RunInProgress,

    #[error("company not found: {0}")]
    CompanyNotFound(String),

    #[error("worker task failed: {0}")]
    Worker(String),
}
