//! Company repository.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::CompanyRecord;
use super::pool::{DbError, SqlitePool};
use super::util::escape_like;
use super::{format_datetime, parse_datetime, parse_datetime_opt};
use crate::models::Company;
use crate::schema::companies;

impl From<CompanyRecord> for Company {
    fn from(record: CompanyRecord) -> Self {
        Company {
            id: record.id,
            name: record.name,
            logo_url: record.logo_url,
            website: record.website,
            careers_url: record.careers_url,
            industry: record.industry,
            size: record.size,
            is_enabled: record.is_enabled != 0,
            scrape_config: serde_json::from_str(&record.scrape_config).unwrap_or_default(),
            last_scraped_at: parse_datetime_opt(record.last_scraped_at),
            last_jobs_found: record.last_jobs_found,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

impl From<&Company> for CompanyRecord {
    fn from(company: &Company) -> Self {
        CompanyRecord {
            id: company.id.clone(),
            name: company.name.clone(),
            logo_url: company.logo_url.clone(),
            website: company.website.clone(),
            careers_url: company.careers_url.clone(),
            industry: company.industry.clone(),
            size: company.size.clone(),
            is_enabled: company.is_enabled as i32,
            scrape_config: serde_json::to_string(&company.scrape_config)
                .unwrap_or_else(|_| "{}".to_string()),
            last_scraped_at: company.last_scraped_at.as_ref().map(format_datetime),
            last_jobs_found: company.last_jobs_found,
            created_at: format_datetime(&company.created_at),
            updated_at: format_datetime(&company.updated_at),
        }
    }
}

/// Company repository.
#[derive(Clone)]
pub struct CompanyRepository {
    pool: SqlitePool,
}

impl CompanyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a company by ID.
    pub async fn get(&self, id: &str) -> Result<Option<Company>, DbError> {
        let mut conn = self.pool.get().await?;

        companies::table
            .find(id)
            .first::<CompanyRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Company::from))
    }

    /// Find a company by exact name (case-insensitive).
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Company>, DbError> {
        let mut conn = self.pool.get().await?;

        // SQLite LIKE without wildcards is a case-insensitive equality.
        companies::table
            .filter(companies::name.like(escape_like(name)).escape('\\'))
            .first::<CompanyRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Company::from))
    }

    /// Get all companies, ordered by name.
    pub async fn get_all(&self) -> Result<Vec<Company>, DbError> {
        let mut conn = self.pool.get().await?;

        companies::table
            .order(companies::name.asc())
            .load::<CompanyRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(Company::from).collect())
    }

    /// Get companies eligible for scraping, ordered by name.
    pub async fn get_enabled(&self) -> Result<Vec<Company>, DbError> {
        let mut conn = self.pool.get().await?;

        companies::table
            .filter(companies::is_enabled.eq(1))
            .order(companies::name.asc())
            .load::<CompanyRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(Company::from).collect())
    }

    /// Get several companies by ID.
    pub async fn get_many(&self, ids: &[String]) -> Result<Vec<Company>, DbError> {
        let mut conn = self.pool.get().await?;

        companies::table
            .filter(companies::id.eq_any(ids.iter().map(String::as_str).collect::<Vec<_>>()))
            .load::<CompanyRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(Company::from).collect())
    }

    /// Insert a new company.
    pub async fn insert(&self, company: &Company) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(companies::table)
            .values(CompanyRecord::from(company))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Overwrite all fields of an existing company. Returns false if it does not exist.
    pub async fn update(&self, company: &Company) -> Result<bool, DbError> {
        let mut conn = self.pool.get().await?;

        let record = CompanyRecord::from(company);
        let rows = diesel::update(companies::table.find(company.id.as_str()))
            .set(&record)
            .execute(&mut conn)
            .await?;

        Ok(rows > 0)
    }

    /// Enable or disable scraping for a company.
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<bool, DbError> {
        let mut conn = self.pool.get().await?;
        let now = format_datetime(&Utc::now());

        let rows = diesel::update(companies::table.find(id))
            .set((
                companies::is_enabled.eq(enabled as i32),
                companies::updated_at.eq(&now),
            ))
            .execute(&mut conn)
            .await?;

        Ok(rows > 0)
    }

    /// Record a successful scrape of a company.
    pub async fn record_scrape(
        &self,
        id: &str,
        scraped_at: DateTime<Utc>,
        jobs_found: i32,
    ) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        let ts = format_datetime(&scraped_at);

        diesel::update(companies::table.find(id))
            .set((
                companies::last_scraped_at.eq(Some(&ts)),
                companies::last_jobs_found.eq(jobs_found),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Delete a company. Its jobs are removed by the foreign key cascade.
    pub async fn delete(&self, id: &str) -> Result<bool, DbError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::delete(companies::table.find(id))
            .execute(&mut conn)
            .await?;

        Ok(rows > 0)
    }
}
