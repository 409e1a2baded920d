//! Database context for managing connections and repository access.

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::company::CompanyRepository;
use super::contact::ContactRepository;
use super::job::JobRepository;
use super::pool::{DbError, SqlitePool};
use super::scraper_log::ScraperLogRepository;

/// Database context that manages the connection factory and provides repository access.
///
/// Create one context per command or service, then use it to access all repositories.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::new(&db_path);
/// let companies = ctx.companies().get_enabled().await?;
/// ```
#[derive(Clone)]
pub struct DbContext {
    pool: SqlitePool,
}

impl DbContext {
    /// Create a new database context from a file path.
    pub fn new(db_path: &Path) -> Self {
        Self {
            pool: SqlitePool::from_path(db_path),
        }
    }

    /// Create a new database context from a URL like `sqlite:path/to/db.sqlite`.
    pub fn from_url(database_url: &str) -> Self {
        Self {
            pool: SqlitePool::new(database_url),
        }
    }

    pub fn companies(&self) -> CompanyRepository {
        CompanyRepository::new(self.pool.clone())
    }

    pub fn jobs(&self) -> JobRepository {
        JobRepository::new(self.pool.clone())
    }

    pub fn scraper_logs(&self) -> ScraperLogRepository {
        ScraperLogRepository::new(self.pool.clone())
    }

    pub fn contacts(&self) -> ContactRepository {
        ContactRepository::new(self.pool.clone())
    }

    /// Create tables and indexes if they don't exist.
    pub async fn init_schema(&self) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute(
            r#"
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS companies (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                logo_url TEXT,
                website TEXT,
                careers_url TEXT NOT NULL,
                industry TEXT,
                size TEXT,
                is_enabled INTEGER NOT NULL DEFAULT 1,
                scrape_config TEXT NOT NULL DEFAULT '{}',
                last_scraped_at TEXT,
                last_jobs_found INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS jobs (
                id TEXT PRIMARY KEY,
                company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                requirements TEXT,
                location TEXT NOT NULL,
                work_arrangement TEXT NOT NULL DEFAULT 'on_site',
                salary_min INTEGER,
                salary_max INTEGER,
                salary_currency TEXT NOT NULL DEFAULT 'SGD',
                salary_period TEXT,
                duration TEXT,
                duration_months INTEGER,
                application_url TEXT NOT NULL,
                posted_at TEXT NOT NULL,
                dedup_key TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                inactive_reason TEXT,
                first_seen_at TEXT NOT NULL,
                last_seen_at TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(company_id, dedup_key)
            );

            CREATE INDEX IF NOT EXISTS idx_jobs_active_posted ON jobs(is_active, posted_at);
            CREATE INDEX IF NOT EXISTS idx_jobs_last_seen ON jobs(is_active, last_seen_at);

            CREATE TABLE IF NOT EXISTS scraper_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                started_at TEXT NOT NULL,
                completed_at TEXT,
                status TEXT NOT NULL,
                triggered_by TEXT NOT NULL DEFAULT 'manual',
                companies_processed INTEGER NOT NULL DEFAULT 0,
                jobs_found INTEGER NOT NULL DEFAULT 0,
                jobs_added INTEGER NOT NULL DEFAULT 0,
                jobs_updated INTEGER NOT NULL DEFAULT 0,
                jobs_skipped INTEGER NOT NULL DEFAULT 0,
                jobs_deactivated INTEGER NOT NULL DEFAULT 0,
                errors TEXT NOT NULL DEFAULT '[]'
            );

            CREATE TABLE IF NOT EXISTS contact_messages (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                subject TEXT,
                message TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .await
    }
}
