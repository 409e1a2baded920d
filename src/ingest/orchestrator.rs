//! One scraper run: fetch every enabled company, store what changed, sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex, Semaphore};
use tracing::{debug, error, info, warn};

use super::dedup::{DedupDecision, Deduplicator};
use super::error::IngestError;
use super::normalize::{normalize_posting, NormalizedJob};
use super::sweeper::{sweep_stale, DEFAULT_STALE_AFTER_DAYS};
use crate::models::{Company, RunCounts, RunError, RunStatus, RunTrigger};
use crate::repository::DbContext;
use crate::scrapers::{extract_postings, filter_by_keywords, PageFetcher};

/// Company name recorded for errors that concern the whole run.
const RUN_SCOPE: &str = "(run)";

/// Tunables for a scraper run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Companies fetched concurrently.
    pub workers: usize,
    /// Upper bound on fetch + extract + normalize for one company.
    pub company_timeout: Duration,
    pub stale_after: chrono::Duration,
    /// Title keywords for companies that do not set their own.
    pub title_keywords: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            company_timeout: Duration::from_secs(60),
            stale_after: chrono::Duration::days(DEFAULT_STALE_AFTER_DAYS),
            title_keywords: vec!["intern".to_string()],
        }
    }
}

/// Result of a finished run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub log_id: i32,
    pub status: RunStatus,
    pub counts: RunCounts,
    pub errors: Vec<RunError>,
}

impl RunSummary {
    /// One-line human summary.
    pub fn message(&self) -> String {
        let c = &self.counts;
        let mut msg = format!(
            "Scraped {} jobs from {} companies: {} new, {} updated, {} unchanged, {} deactivated",
            c.jobs_found,
            c.companies_processed,
            c.jobs_added,
            c.jobs_updated,
            c.jobs_skipped,
            c.jobs_deactivated
        );
        if !self.errors.is_empty() {
            msg.push_str(&format!(" ({} errors)", self.errors.len()));
        }
        msg
    }
}

/// Outcome of the concurrent part of scraping one company.
struct CompanyOutcome {
    company: Company,
    result: Result<Vec<NormalizedJob>, IngestError>,
}

/// Runs the ingestion pipeline, one run at a time.
pub struct Orchestrator {
    ctx: DbContext,
    fetcher: Arc<dyn PageFetcher>,
    config: PipelineConfig,
    run_lock: Mutex<()>,
}

impl Orchestrator {
    pub fn new(ctx: DbContext, fetcher: Arc<dyn PageFetcher>, config: PipelineConfig) -> Self {
        Self {
            ctx,
            fetcher,
            config,
            run_lock: Mutex::new(()),
        }
    }

    /// Whether a run is currently holding the lock.
    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// Scrape every enabled company.
    pub async fn run(&self, trigger: RunTrigger) -> Result<RunSummary, IngestError> {
        self.execute(trigger, None).await
    }

    /// Scrape only the given companies, enabled or not.
    pub async fn run_only(
        &self,
        trigger: RunTrigger,
        company_ids: &[String],
    ) -> Result<RunSummary, IngestError> {
        let found = self.ctx.companies().get_many(company_ids).await?;
        if let Some(missing) = company_ids
            .iter()
            .find(|id| !found.iter().any(|c| &c.id == *id))
        {
            return Err(IngestError::CompanyNotFound(missing.clone()));
        }
        self.execute(trigger, Some(company_ids)).await
    }

    async fn execute(
        &self,
        trigger: RunTrigger,
        company_ids: Option<&[String]>,
    ) -> Result<RunSummary, IngestError> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| IngestError::RunInProgress)?;

        let logs = self.ctx.scraper_logs();
        let started = Utc::now();
        let interrupted = logs.fail_interrupted(started).await?;
        if interrupted > 0 {
            warn!("Marked {} interrupted runs as failed", interrupted);
        }
        let log_id = logs.start(trigger, started).await?;
        info!("Scraper run {} started ({})", log_id, trigger.as_str());

        let mut counts = RunCounts::default();
        let mut errors = Vec::new();
        let mut run_failed = false;
        let mut companies_failed = 0;

        let companies = match company_ids {
            Some(ids) => self.ctx.companies().get_many(ids).await,
            None => self.ctx.companies().get_enabled().await,
        };
        match companies {
            Ok(companies) => {
                companies_failed = self
                    .process_companies(companies, &mut counts, &mut errors)
                    .await;
            }
            Err(e) => {
                error!("Failed to load companies: {}", e);
                errors.push(RunError::new(RUN_SCOPE, format!("failed to load companies: {e}")));
                run_failed = true;
            }
        }

        match sweep_stale(&self.ctx.jobs(), self.config.stale_after, Utc::now()).await {
            Ok(swept) => counts.jobs_deactivated = swept as i32,
            Err(e) => {
                error!("Staleness sweep failed: {}", e);
                errors.push(RunError::new(RUN_SCOPE, format!("staleness sweep failed: {e}")));
                run_failed = true;
            }
        }

        let all_failed =
            counts.companies_processed > 0 && companies_failed == counts.companies_processed;
        let status = if run_failed || all_failed {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };

        logs.finish(log_id, status, &counts, &errors, Utc::now())
            .await?;

        let summary = RunSummary {
            log_id,
            status,
            counts,
            errors,
        };
        info!("Scraper run {} {}: {}", log_id, status.as_str(), summary.message());
        Ok(summary)
    }

    /// Scrape companies on the worker pool and persist results as they arrive.
    ///
    /// Returns the number of companies that failed.
    async fn process_companies(
        &self,
        companies: Vec<Company>,
        counts: &mut RunCounts,
        errors: &mut Vec<RunError>,
    ) -> i32 {
        if companies.is_empty() {
            info!("No companies to scrape");
            return 0;
        }

        let workers = self.config.workers.max(1);
        debug!("Scraping {} companies with {} workers", companies.len(), workers);

        let semaphore = Arc::new(Semaphore::new(workers));
        let (tx, mut rx) = mpsc::channel::<CompanyOutcome>(companies.len());
        let mut handles = Vec::with_capacity(companies.len());

        for company in companies {
            let semaphore = semaphore.clone();
            let fetcher = self.fetcher.clone();
            let tx = tx.clone();
            let timeout = self.config.company_timeout;
            let keywords = if company.scrape_config.title_keywords.is_empty() {
                self.config.title_keywords.clone()
            } else {
                company.scrape_config.title_keywords.clone()
            };
            let name = company.name.clone();

            let handle = tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let result = match tokio::time::timeout(
                    timeout,
                    scrape_company(fetcher.as_ref(), &company, &keywords),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(IngestError::Timeout(timeout)),
                };
                let _ = tx.send(CompanyOutcome { company, result }).await;
            });
            handles.push((name, handle));
        }
        drop(tx);

        let mut failed = 0;
        let mut dedup = Deduplicator::new(self.ctx.jobs());

        while let Some(outcome) = rx.recv().await {
            counts.companies_processed += 1;
            let company = outcome.company;

            let jobs = match outcome.result {
                Ok(jobs) => jobs,
                Err(e) => {
                    warn!("Scraping {} failed: {}", company.name, e);
                    errors.push(RunError::new(&company.name, &e));
                    failed += 1;
                    continue;
                }
            };

            let found = jobs.len() as i32;
            counts.jobs_found += found;

            if let Err(e) = persist_jobs(&mut dedup, jobs, counts).await {
                warn!("Storing jobs for {} failed: {}", company.name, e);
                errors.push(RunError::new(&company.name, &e));
                failed += 1;
                continue;
            }

            if let Err(e) = self
                .ctx
                .companies()
                .record_scrape(&company.id, Utc::now(), found)
                .await
            {
                warn!("Recording scrape of {} failed: {}", company.name, e);
                errors.push(RunError::new(&company.name, &e));
                failed += 1;
                continue;
            }

            counts.companies_updated += 1;
            info!("{}: {} postings", company.name, found);
        }

        // Tasks that panicked never reported back.
        for (name, handle) in handles {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    error!("Worker for {} panicked", name);
                    counts.companies_processed += 1;
                    errors.push(RunError::new(
                        name,
                        IngestError::Worker("worker panicked".to_string()),
                    ));
                    failed += 1;
                }
            }
        }

        failed
    }
}

/// Fetch, extract and normalize one company's postings.
async fn scrape_company(
    fetcher: &dyn PageFetcher,
    company: &Company,
    keywords: &[String],
) -> Result<Vec<NormalizedJob>, IngestError> {
    let page = fetcher.fetch(company.fetch_url()).await?;
    let postings = extract_postings(&company.scrape_config, &page)?;
    let total = postings.len();
    let postings = filter_by_keywords(postings, keywords);
    if postings.len() < total {
        debug!(
            "{}: kept {} of {} postings matching title keywords",
            company.name,
            postings.len(),
            total
        );
    }

    let now = Utc::now();
    Ok(postings
        .iter()
        .filter_map(|raw| normalize_posting(raw, company, &page.url, now))
        .collect())
}

async fn persist_jobs(
    dedup: &mut Deduplicator,
    jobs: Vec<NormalizedJob>,
    counts: &mut RunCounts,
) -> Result<(), IngestError> {
    for job in jobs {
        match dedup.ingest(job, Utc::now()).await? {
            DedupDecision::Insert => counts.jobs_added += 1,
            DedupDecision::Update => counts.jobs_updated += 1,
            DedupDecision::Skip => counts.jobs_skipped += 1,
        }
    }
    Ok(())
}
