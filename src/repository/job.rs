//! Job repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Serialize;

use super::models::{CompanyRecord, JobRecord};
use super::pool::{DbError, SqlitePool};
use super::util::{like_pattern, page_offset};
use super::{format_datetime, parse_datetime};
use crate::models::{InactiveReason, Job, JobFilter, JobListing, SalaryPeriod, WorkArrangement};
use crate::schema::{companies, jobs};

impl From<JobRecord> for Job {
    fn from(record: JobRecord) -> Self {
        Job {
            id: record.id,
            company_id: record.company_id,
            title: record.title,
            slug: record.slug,
            description: record.description,
            requirements: record.requirements,
            location: record.location,
            work_arrangement: WorkArrangement::from_str(&record.work_arrangement)
                .unwrap_or_default(),
            salary_min: record.salary_min,
            salary_max: record.salary_max,
            salary_currency: record.salary_currency,
            salary_period: record
                .salary_period
                .as_deref()
                .and_then(SalaryPeriod::from_str),
            duration: record.duration,
            duration_months: record.duration_months,
            application_url: record.application_url,
            posted_at: parse_datetime(&record.posted_at),
            dedup_key: record.dedup_key,
            content_hash: record.content_hash,
            is_active: record.is_active != 0,
            inactive_reason: record
                .inactive_reason
                .as_deref()
                .and_then(InactiveReason::from_str),
            first_seen_at: parse_datetime(&record.first_seen_at),
            last_seen_at: parse_datetime(&record.last_seen_at),
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

impl From<&Job> for JobRecord {
    fn from(job: &Job) -> Self {
        JobRecord {
            id: job.id.clone(),
            company_id: job.company_id.clone(),
            title: job.title.clone(),
            slug: job.slug.clone(),
            description: job.description.clone(),
            requirements: job.requirements.clone(),
            location: job.location.clone(),
            work_arrangement: job.work_arrangement.as_str().to_string(),
            salary_min: job.salary_min,
            salary_max: job.salary_max,
            salary_currency: job.salary_currency.clone(),
            salary_period: job.salary_period.map(|p| p.as_str().to_string()),
            duration: job.duration.clone(),
            duration_months: job.duration_months,
            application_url: job.application_url.clone(),
            posted_at: format_datetime(&job.posted_at),
            dedup_key: job.dedup_key.clone(),
            content_hash: job.content_hash.clone(),
            is_active: job.is_active as i32,
            inactive_reason: job.inactive_reason.map(|r| r.as_str().to_string()),
            first_seen_at: format_datetime(&job.first_seen_at),
            last_seen_at: format_datetime(&job.last_seen_at),
            created_at: format_datetime(&job.created_at),
            updated_at: format_datetime(&job.updated_at),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> i64 {
        if self.limit <= 0 {
            return 0;
        }
        (self.total + self.limit - 1) / self.limit
    }
}

/// Apply a `JobFilter` to a boxed jobs query.
macro_rules! apply_job_filter {
    ($query:ident, $filter:expr) => {{
        let filter: &JobFilter = $filter;
        $query = $query.filter(jobs::is_active.eq(1));
        if let Some(ref q) = filter.query {
            let pattern = like_pattern(q);
            $query = $query.filter(
                jobs::title
                    .like(pattern.clone())
                    .escape('\\')
                    .or(jobs::description.like(pattern).escape('\\')),
            );
        }
        if let Some(ref location) = filter.location {
            $query = $query.filter(jobs::location.like(like_pattern(location)).escape('\\'));
        }
        if let Some(arrangement) = filter.arrangement {
            $query = $query.filter(jobs::work_arrangement.eq(arrangement.as_str()));
        }
        if let Some(ref company_id) = filter.company_id {
            $query = $query.filter(jobs::company_id.eq(company_id.clone()));
        }
    }};
}

/// Job repository.
#[derive(Clone)]
pub struct JobRepository {
    pool: SqlitePool,
}

impl JobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a job by ID.
    pub async fn get(&self, id: &str) -> Result<Option<Job>, DbError> {
        let mut conn = self.pool.get().await?;

        jobs::table
            .find(id)
            .first::<JobRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Job::from))
    }

    /// Get a job and its company by slug, active or not.
    pub async fn get_listing_by_slug(&self, slug: &str) -> Result<Option<JobListing>, DbError> {
        let mut conn = self.pool.get().await?;

        let row = jobs::table
            .inner_join(companies::table)
            .filter(jobs::slug.eq(slug))
            .select((JobRecord::as_select(), CompanyRecord::as_select()))
            .first::<(JobRecord, CompanyRecord)>(&mut conn)
            .await
            .optional()?;

        Ok(row.map(|(job, company)| JobListing {
            job: Job::from(job),
            company_name: company.name,
            company_logo_url: company.logo_url,
        }))
    }

    /// Find the job a posting maps to within its company.
    pub async fn find_by_dedup_key(
        &self,
        company_id: &str,
        dedup_key: &str,
    ) -> Result<Option<Job>, DbError> {
        let mut conn = self.pool.get().await?;

        jobs::table
            .filter(jobs::company_id.eq(company_id))
            .filter(jobs::dedup_key.eq(dedup_key))
            .first::<JobRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Job::from))
    }

    /// Check if a slug is taken.
    pub async fn slug_exists(&self, slug: &str) -> Result<bool, DbError> {
        let mut conn = self.pool.get().await?;

        let count: i64 = jobs::table
            .filter(jobs::slug.eq(slug))
            .select(count_star())
            .first(&mut conn)
            .await?;

        Ok(count > 0)
    }

    /// Insert a new job.
    pub async fn insert(&self, job: &Job) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(jobs::table)
            .values(JobRecord::from(job))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Overwrite all fields of an existing job.
    pub async fn update(&self, job: &Job) -> Result<bool, DbError> {
        let mut conn = self.pool.get().await?;

        let record = JobRecord::from(job);
        let rows = diesel::update(jobs::table.find(job.id.as_str()))
            .set(&record)
            .execute(&mut conn)
            .await?;

        Ok(rows > 0)
    }

    /// Record that a scrape saw this job again without changes.
    pub async fn touch_seen(&self, id: &str, seen_at: DateTime<Utc>) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        let ts = format_datetime(&seen_at);

        diesel::update(jobs::table.find(id))
            .set(jobs::last_seen_at.eq(&ts))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Activate or deactivate a job by hand.
    ///
    /// Deactivation records `reason`; activation clears it and counts as a
    /// fresh sighting so the job is not swept again immediately.
    pub async fn set_active(
        &self,
        id: &str,
        active: bool,
        reason: InactiveReason,
    ) -> Result<bool, DbError> {
        let mut conn = self.pool.get().await?;
        let now = format_datetime(&Utc::now());

        let rows = if active {
            diesel::update(jobs::table.find(id))
                .set((
                    jobs::is_active.eq(1),
                    jobs::inactive_reason.eq(None::<String>),
                    jobs::last_seen_at.eq(&now),
                    jobs::updated_at.eq(&now),
                ))
                .execute(&mut conn)
                .await?
        } else {
            diesel::update(jobs::table.find(id))
                .set((
                    jobs::is_active.eq(0),
                    jobs::inactive_reason.eq(Some(reason.as_str())),
                    jobs::updated_at.eq(&now),
                ))
                .execute(&mut conn)
                .await?
        };

        Ok(rows > 0)
    }

    /// Search active jobs, newest posting first.
    pub async fn search(
        &self,
        filter: &JobFilter,
        page: i64,
        limit: i64,
    ) -> Result<Page<JobListing>, DbError> {
        let mut conn = self.pool.get().await?;

        let mut count_query = jobs::table.select(count_star()).into_boxed();
        apply_job_filter!(count_query, filter);
        let total: i64 = count_query.first(&mut conn).await?;

        let mut query = jobs::table.into_boxed();
        apply_job_filter!(query, filter);
        let records: Vec<JobRecord> = query
            .order((jobs::posted_at.desc(), jobs::id.asc()))
            .offset(page_offset(page, limit))
            .limit(limit)
            .load(&mut conn)
            .await?;

        let company_ids: Vec<&str> = records.iter().map(|r| r.company_id.as_str()).collect();
        let companies: HashMap<String, CompanyRecord> = companies::table
            .filter(companies::id.eq_any(company_ids))
            .load::<CompanyRecord>(&mut conn)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        let items = records
            .into_iter()
            .map(|record| {
                let company = companies.get(&record.company_id);
                JobListing {
                    company_name: company.map(|c| c.name.clone()).unwrap_or_default(),
                    company_logo_url: company.and_then(|c| c.logo_url.clone()),
                    job: Job::from(record),
                }
            })
            .collect();

        Ok(Page {
            items,
            total,
            page,
            limit,
        })
    }

    /// Number of active jobs per company.
    pub async fn count_active_by_company(&self) -> Result<HashMap<String, i64>, DbError> {
        let mut conn = self.pool.get().await?;

        let rows: Vec<(String, i64)> = jobs::table
            .filter(jobs::is_active.eq(1))
            .group_by(jobs::company_id)
            .select((jobs::company_id, count_star()))
            .load(&mut conn)
            .await?;

        Ok(rows.into_iter().collect())
    }

    /// Count active jobs last seen before `cutoff`.
    pub async fn count_stale(&self, cutoff: DateTime<Utc>) -> Result<i64, DbError> {
        let mut conn = self.pool.get().await?;
        let cutoff = format_datetime(&cutoff);

        jobs::table
            .filter(jobs::is_active.eq(1))
            .filter(jobs::last_seen_at.lt(&cutoff))
            .select(count_star())
            .first(&mut conn)
            .await
    }

    /// Deactivate active jobs last seen before `cutoff`. Returns the number changed.
    pub async fn deactivate_stale(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<usize, DbError> {
        let mut conn = self.pool.get().await?;
        let cutoff = format_datetime(&cutoff);
        let now = format_datetime(&now);

        diesel::update(
            jobs::table
                .filter(jobs::is_active.eq(1))
                .filter(jobs::last_seen_at.lt(&cutoff)),
        )
        .set((
            jobs::is_active.eq(0),
            jobs::inactive_reason.eq(Some(InactiveReason::Stale.as_str())),
            jobs::updated_at.eq(&now),
        ))
        .execute(&mut conn)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::normalize_posting;
    use crate::models::Company;
    use crate::repository::DbContext;
    use crate::scrapers::RawPosting;
    use chrono::Duration;
    use tempfile::tempdir;

    async fn setup() -> (DbContext, Company, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        let mut company = Company::new("Acme".into(), "https://acme.sg/careers".into());
        company.logo_url = Some("https://acme.sg/logo.png".into());
        ctx.companies().insert(&company).await.unwrap();
        (ctx, company, dir)
    }

    async fn add_job(ctx: &DbContext, company: &Company, raw: RawPosting, age_days: i64) -> Job {
        let now = Utc::now();
        let mut job = normalize_posting(&raw, company, &company.careers_url, now)
            .unwrap()
            .into_job(now);
        job.posted_at = now - Duration::days(age_days);
        ctx.jobs().insert(&job).await.unwrap();
        job
    }

    #[tokio::test]
    async fn test_search_filters_and_order() {
        let (ctx, company, _dir) = setup().await;
        let data = add_job(
            &ctx,
            &company,
            RawPosting {
                title: "Data Science Intern".into(),
                description: Some("Work with pandas and SQL".into()),
                ..Default::default()
            },
            3,
        )
        .await;
        let design = add_job(
            &ctx,
            &company,
            RawPosting {
                title: "Design Intern".into(),
                remote: true,
                ..Default::default()
            },
            1,
        )
        .await;

        let repo = ctx.jobs();
        let all = repo.search(&JobFilter::default(), 1, 20).await.unwrap();
        assert_eq!(all.total, 2);
        // Newest posting first.
        assert_eq!(all.items[0].job.id, design.id);
        assert_eq!(all.items[0].company_name, "Acme");
        assert_eq!(
            all.items[0].company_logo_url.as_deref(),
            Some("https://acme.sg/logo.png")
        );

        let filter = JobFilter {
            query: Some("PANDAS".into()),
            ..Default::default()
        };
        let found = repo.search(&filter, 1, 20).await.unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.items[0].job.id, data.id);

        let filter = JobFilter {
            arrangement: Some(WorkArrangement::Remote),
            ..Default::default()
        };
        let found = repo.search(&filter, 1, 20).await.unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.items[0].job.id, design.id);

        let filter = JobFilter {
            company_id: Some("nobody".into()),
            ..Default::default()
        };
        assert_eq!(repo.search(&filter, 1, 20).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_search_pagination() {
        let (ctx, company, _dir) = setup().await;
        for i in 0..5 {
            let raw = RawPosting {
                title: format!("Intern {}", i),
                url: Some(format!("https://acme.sg/careers/{}", i)),
                ..Default::default()
            };
            add_job(&ctx, &company, raw, i).await;
        }

        let page = ctx.jobs().search(&JobFilter::default(), 2, 2).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.items[0].job.title, "Intern 2");

        let last = ctx.jobs().search(&JobFilter::default(), 3, 2).await.unwrap();
        assert_eq!(last.items.len(), 1);
    }

    #[tokio::test]
    async fn test_search_past_last_page() {
        let (ctx, company, _dir) = setup().await;
        add_job(
            &ctx,
            &company,
            RawPosting {
                title: "Finance Intern".into(),
                ..Default::default()
            },
            0,
        )
        .await;

        let page = ctx
            .jobs()
            .search(&JobFilter::default(), i64::MAX, 100)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert!(page.items.is_empty());
        assert_eq!(page.page, i64::MAX);
    }

    #[tokio::test]
    async fn test_set_active_and_counts() {
        let (ctx, company, _dir) = setup().await;
        let job = add_job(
            &ctx,
            &company,
            RawPosting {
                title: "Marketing Intern".into(),
                ..Default::default()
            },
            0,
        )
        .await;
        let repo = ctx.jobs();

        assert!(repo.slug_exists(&job.slug).await.unwrap());
        assert_eq!(repo.count_active_by_company().await.unwrap()[&company.id], 1);

        assert!(repo
            .set_active(&job.id, false, InactiveReason::Employer)
            .await
            .unwrap());
        let stored = repo.get(&job.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert_eq!(stored.inactive_reason, Some(InactiveReason::Employer));
        assert!(repo.count_active_by_company().await.unwrap().is_empty());
        assert_eq!(repo.search(&JobFilter::default(), 1, 20).await.unwrap().total, 0);

        // Still reachable by slug.
        assert!(repo.get_listing_by_slug(&job.slug).await.unwrap().is_some());

        assert!(repo
            .set_active(&job.id, true, InactiveReason::Employer)
            .await
            .unwrap());
        let stored = repo.get(&job.id).await.unwrap().unwrap();
        assert!(stored.is_active);
        assert_eq!(stored.inactive_reason, None);

        assert!(!repo
            .set_active("missing", false, InactiveReason::Employer)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_jobs_removed_with_company() {
        let (ctx, company, _dir) = setup().await;
        let job = add_job(
            &ctx,
            &company,
            RawPosting {
                title: "Finance Intern".into(),
                ..Default::default()
            },
            0,
        )
        .await;

        ctx.companies().delete(&company.id).await.unwrap();
        assert!(ctx.jobs().get(&job.id).await.unwrap().is_none());
    }
}
