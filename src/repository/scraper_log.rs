//! Scraper run log repository.

use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::job::Page;
use super::models::{LastInsertRowId, NewScraperLog, ScraperLogRecord};
use super::pool::{DbError, SqlitePool};
use super::util::page_offset;
use super::{format_datetime, parse_datetime, parse_datetime_opt};
use crate::models::{RunCounts, RunError, RunStatus, RunTrigger, ScraperLog};
use crate::schema::scraper_logs;

impl From<ScraperLogRecord> for ScraperLog {
    fn from(record: ScraperLogRecord) -> Self {
        ScraperLog {
            id: record.id,
            started_at: parse_datetime(&record.started_at),
            completed_at: parse_datetime_opt(record.completed_at),
            status: RunStatus::from_str(&record.status).unwrap_or(RunStatus::Failed),
            trigger: RunTrigger::from_str(&record.triggered_by).unwrap_or(RunTrigger::Manual),
            companies_processed: record.companies_processed,
            jobs_found: record.jobs_found,
            jobs_added: record.jobs_added,
            jobs_updated: record.jobs_updated,
            jobs_skipped: record.jobs_skipped,
            jobs_deactivated: record.jobs_deactivated,
            errors: serde_json::from_str(&record.errors).unwrap_or_default(),
        }
    }
}

/// Scraper run log repository. Rows are created `running` and finalized once.
#[derive(Clone)]
pub struct ScraperLogRepository {
    pool: SqlitePool,
}

impl ScraperLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a `running` row for a new run and return its id.
    pub async fn start(
        &self,
        trigger: RunTrigger,
        started_at: DateTime<Utc>,
    ) -> Result<i32, DbError> {
        let mut conn = self.pool.get().await?;
        let started_at = format_datetime(&started_at);

        diesel::insert_into(scraper_logs::table)
            .values(NewScraperLog {
                started_at: &started_at,
                status: RunStatus::Running.as_str(),
                triggered_by: trigger.as_str(),
                errors: "[]",
            })
            .execute(&mut conn)
            .await?;

        let row: LastInsertRowId = diesel::sql_query("SELECT last_insert_rowid()")
            .get_result(&mut conn)
            .await?;
        Ok(row.id as i32)
    }

    /// Write final counts, errors and status for a run.
    pub async fn finish(
        &self,
        id: i32,
        status: RunStatus,
        counts: &RunCounts,
        errors: &[RunError],
        completed_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        let completed_at = format_datetime(&completed_at);
        let errors_json = serde_json::to_string(errors).unwrap_or_else(|_| "[]".to_string());

        diesel::update(scraper_logs::table.find(id))
            .set((
                scraper_logs::status.eq(status.as_str()),
                scraper_logs::completed_at.eq(Some(&completed_at)),
                scraper_logs::companies_processed.eq(counts.companies_processed),
                scraper_logs::jobs_found.eq(counts.jobs_found),
                scraper_logs::jobs_added.eq(counts.jobs_added),
                scraper_logs::jobs_updated.eq(counts.jobs_updated),
                scraper_logs::jobs_skipped.eq(counts.jobs_skipped),
                scraper_logs::jobs_deactivated.eq(counts.jobs_deactivated),
                scraper_logs::errors.eq(&errors_json),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Mark rows still `running` as failed. Used at run start: only one run
    /// is active per process, so anything left running was interrupted.
    pub async fn fail_interrupted(&self, now: DateTime<Utc>) -> Result<usize, DbError> {
        let mut conn = self.pool.get().await?;
        let now = format_datetime(&now);
        let errors = serde_json::to_string(&[RunError::new("run", "interrupted before completion")])
            .unwrap_or_else(|_| "[]".to_string());

        diesel::update(scraper_logs::table.filter(scraper_logs::status.eq(RunStatus::Running.as_str())))
            .set((
                scraper_logs::status.eq(RunStatus::Failed.as_str()),
                scraper_logs::completed_at.eq(Some(&now)),
                scraper_logs::errors.eq(&errors),
            ))
            .execute(&mut conn)
            .await
    }

    /// Get a run by id.
    pub async fn get(&self, id: i32) -> Result<Option<ScraperLog>, DbError> {
        let mut conn = self.pool.get().await?;

        scraper_logs::table
            .find(id)
            .first::<ScraperLogRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(ScraperLog::from))
    }

    /// Page through runs, newest first.
    pub async fn list(&self, page: i64, limit: i64) -> Result<Page<ScraperLog>, DbError> {
        let mut conn = self.pool.get().await?;

        let total: i64 = scraper_logs::table
            .select(count_star())
            .first(&mut conn)
            .await?;

        let items = scraper_logs::table
            .order(scraper_logs::id.desc())
            .offset(page_offset(page, limit))
            .limit(limit)
            .load::<ScraperLogRecord>(&mut conn)
            .await?
            .into_iter()
            .map(ScraperLog::from)
            .collect();

        Ok(Page {
            items,
            total,
            page,
            limit,
        })
    }
}
