//! Diesel records for database tables.
//!
//! Timestamps are RFC 3339 text and booleans are 0/1 integers; conversion
//! to domain models lives next to each repository.

use diesel::prelude::*;

use crate::schema;

/// Company record from the database.
#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = schema::companies)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CompanyRecord {
    pub id: String,
    pub name: String,
    pub logo_url: Option<String>,
    pub website: Option<String>,
    pub careers_url: String,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub is_enabled: i32,
    pub scrape_config: String,
    pub last_scraped_at: Option<String>,
    pub last_jobs_found: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// Job record from the database.
#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = schema::jobs)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct JobRecord {
    pub id: String,
    pub company_id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub requirements: Option<String>,
    pub location: String,
    pub work_arrangement: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub salary_currency: String,
    pub salary_period: Option<String>,
    pub duration: Option<String>,
    pub duration_months: Option<i32>,
    pub application_url: String,
    pub posted_at: String,
    pub dedup_key: String,
    pub content_hash: String,
    pub is_active: i32,
    pub inactive_reason: Option<String>,
    pub first_seen_at: String,
    pub last_seen_at: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Scraper log record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::scraper_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ScraperLogRecord {
    pub id: i32,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub status: String,
    pub triggered_by: String,
    pub companies_processed: i32,
    pub jobs_found: i32,
    pub jobs_added: i32,
    pub jobs_updated: i32,
    pub jobs_skipped: i32,
    pub jobs_deactivated: i32,
    pub errors: String,
}

/// New scraper log for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::scraper_logs)]
pub struct NewScraperLog<'a> {
    pub started_at: &'a str,
    pub status: &'a str,
    pub triggered_by: &'a str,
    pub errors: &'a str,
}

/// Contact message record from the database.
#[derive(Queryable, Selectable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::contact_messages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ContactMessageRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub created_at: String,
}

/// Row id of the last insert on a connection.
#[derive(QueryableByName, Debug)]
pub struct LastInsertRowId {
    #[diesel(sql_type = diesel::sql_types::BigInt, column_name = "last_insert_rowid()")]
    pub id: i64,
}
