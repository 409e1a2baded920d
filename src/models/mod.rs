//! Data models for internscout.

mod company;
mod contact;
mod job;
mod scraper_log;

pub use company::{validate_company, Company, CompanyPatch, NewCompany};
pub use contact::{ContactForm, ContactMessage, MIN_MESSAGE_LEN};
pub use job::{InactiveReason, Job, JobFilter, JobListing, SalaryPeriod, WorkArrangement};
pub use scraper_log::{RunCounts, RunError, RunStatus, RunTrigger, ScraperLog};
