//! Job posting models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the intern is expected to work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkArrangement {
    #[default]
    OnSite,
    Hybrid,
    Remote,
}

impl WorkArrangement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnSite => "on_site",
            Self::Hybrid => "hybrid",
            Self::Remote => "remote",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "on_site" | "onsite" | "on-site" => Some(Self::OnSite),
            "hybrid" => Some(Self::Hybrid),
            "remote" => Some(Self::Remote),
            _ => None,
        }
    }
}

/// Pay period attached to a salary range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryPeriod {
    Hour,
    Month,
    Year,
}

impl SalaryPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "hour" => Some(Self::Hour),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }
}

/// Why a job is no longer listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InactiveReason {
    /// Not re-confirmed by a scrape within the staleness window.
    Stale,
    /// Removed by an admin.
    Removed,
    /// Closed by the employer. Scrapes never reactivate these.
    Employer,
}

impl InactiveReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stale => "stale",
            Self::Removed => "removed",
            Self::Employer => "employer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "stale" => Some(Self::Stale),
            "removed" => Some(Self::Removed),
            "employer" => Some(Self::Employer),
            _ => None,
        }
    }

    /// Whether a fresh sighting by the scraper may reactivate the job.
    pub fn allows_reactivation(&self) -> bool {
        !matches!(self, Self::Employer)
    }
}

/// An internship posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub company_id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub requirements: Option<String>,
    pub location: String,
    pub work_arrangement: WorkArrangement,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub salary_currency: String,
    pub salary_period: Option<SalaryPeriod>,
    /// Duration as advertised, e.g. "3-6 months".
    pub duration: Option<String>,
    pub duration_months: Option<i32>,
    pub application_url: String,
    pub posted_at: DateTime<Utc>,
    /// Identity of the posting within its company.
    #[serde(skip_serializing)]
    pub dedup_key: String,
    #[serde(skip_serializing)]
    pub content_hash: String,
    pub is_active: bool,
    pub inactive_reason: Option<InactiveReason>,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A job joined with the display fields of its company.
#[derive(Debug, Clone, Serialize)]
pub struct JobListing {
    #[serde(flatten)]
    pub job: Job,
    pub company_name: String,
    pub company_logo_url: Option<String>,
}

/// Filters for the public job search.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    /// Case-insensitive substring of title or description.
    pub query: Option<String>,
    pub location: Option<String>,
    pub arrangement: Option<WorkArrangement>,
    pub company_id: Option<String>,
}
