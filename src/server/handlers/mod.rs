//! HTTP request handlers for the web server.

mod api;
mod companies;
mod contact;
mod helpers;
mod jobs;
mod scraper;

// Re-export handlers for use by the router
pub use api::health;
pub use companies::{create_company, delete_company, list_companies, update_company};
pub use contact::submit_contact;
pub use jobs::{job_detail, search_jobs, update_job_status};
pub use scraper::{list_scraper_logs, trigger_scraper};
