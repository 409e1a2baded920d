//! Scraper run provenance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a scraper run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// What started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTrigger {
    Manual,
    Scheduled,
    Cli,
}

impl RunTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Scheduled => "scheduled",
            Self::Cli => "cli",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(Self::Manual),
            "scheduled" => Some(Self::Scheduled),
            "cli" => Some(Self::Cli),
            _ => None,
        }
    }
}

/// A failure scoped to one company or to the run as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    pub company: String,
    pub error: String,
}

impl RunError {
    pub fn new(company: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            company: company.into(),
            error: error.to_string(),
        }
    }
}

/// One row per scraper run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperLog {
    pub id: i32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub trigger: RunTrigger,
    pub companies_processed: i32,
    pub jobs_found: i32,
    pub jobs_added: i32,
    pub jobs_updated: i32,
    pub jobs_skipped: i32,
    pub jobs_deactivated: i32,
    pub errors: Vec<RunError>,
}

/// Counters accumulated while a run is in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub companies_processed: i32,
    pub companies_updated: i32,
    pub jobs_found: i32,
    pub jobs_added: i32,
    pub jobs_updated: i32,
    pub jobs_skipped: i32,
    pub jobs_deactivated: i32,
}
