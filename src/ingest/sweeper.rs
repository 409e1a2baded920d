//! Deactivation of jobs no scrape has confirmed recently.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::repository::{DbError, JobRepository};

/// Default staleness window.
pub const DEFAULT_STALE_AFTER_DAYS: i64 = 90;

/// Mark active jobs last seen more than `stale_after` before `now` as stale.
///
/// Returns the number of jobs deactivated.
pub async fn sweep_stale(
    jobs: &JobRepository,
    stale_after: Duration,
    now: DateTime<Utc>,
) -> Result<usize, DbError> {
    let cutoff = now - stale_after;
    let swept = jobs.deactivate_stale(cutoff, now).await?;
    if swept > 0 {
        info!(
            "Deactivated {} jobs not seen since {}",
            swept,
            cutoff.format("%Y-%m-%d")
        );
    }
    Ok(swept)
}

/// Number of jobs `sweep_stale` would deactivate.
pub async fn count_stale(
    jobs: &JobRepository,
    stale_after: Duration,
    now: DateTime<Utc>,
) -> Result<i64, DbError> {
    jobs.count_stale(now - stale_after).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::normalize::normalize_posting;
    use crate::models::{Company, InactiveReason};
    use crate::repository::DbContext;
    use crate::scrapers::RawPosting;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_sweep_window() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        let company = Company::new("Acme".into(), "https://acme.sg/careers".into());
        ctx.companies().insert(&company).await.unwrap();

        let now = Utc::now();
        let mut ids = Vec::new();
        for (title, days_ago) in [("Data Intern", 91), ("Design Intern", 89)] {
            let raw = RawPosting {
                title: title.into(),
                ..Default::default()
            };
            let seen = now - Duration::days(days_ago);
            let job = normalize_posting(&raw, &company, &company.careers_url, seen)
                .unwrap()
                .into_job(seen);
            ctx.jobs().insert(&job).await.unwrap();
            ids.push(job.id);
        }

        let window = Duration::days(DEFAULT_STALE_AFTER_DAYS);
        assert_eq!(count_stale(&ctx.jobs(), window, now).await.unwrap(), 1);
        assert_eq!(sweep_stale(&ctx.jobs(), window, now).await.unwrap(), 1);

        let old = ctx.jobs().get(&ids[0]).await.unwrap().unwrap();
        assert!(!old.is_active);
        assert_eq!(old.inactive_reason, Some(InactiveReason::Stale));

        let recent = ctx.jobs().get(&ids[1]).await.unwrap().unwrap();
        assert!(recent.is_active);

        // Already-stale jobs are not counted twice.
        assert_eq!(sweep_stale(&ctx.jobs(), window, now).await.unwrap(), 0);
    }
}
