//! Fetching careers pages and extracting raw job postings.

pub mod config;
pub mod error;
pub mod extract;
mod http_client;
pub mod rate_limiter;

pub use config::{ApiFieldPaths, HtmlSelectors, ScrapeConfig, Strategy};
pub use error::{ExtractError, FetchError};
pub use extract::{extract_postings, filter_by_keywords, RawPosting, RawSalary};
pub use http_client::{resolve_user_agent, FetchedPage, HttpClient, PageFetcher, USER_AGENT};
pub use rate_limiter::{DomainStats, RateLimitConfig, RateLimiter};
