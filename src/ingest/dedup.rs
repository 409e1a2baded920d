//! Matching normalized postings against stored jobs.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::normalize::NormalizedJob;
use crate::models::Job;
use crate::repository::{DbError, JobRepository};

/// Slug suffixes tried before giving up on a readable slug.
const MAX_SLUG_ATTEMPTS: usize = 20;

/// What happened to one normalized posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupDecision {
    Insert,
    Update,
    Skip,
}

/// Decide how to store `incoming` given the job with the same identity, if any.
pub fn decide(existing: Option<&Job>, incoming: &NormalizedJob) -> DedupDecision {
    let Some(job) = existing else {
        return DedupDecision::Insert;
    };

    if !job.is_active {
        return match job.inactive_reason {
            Some(reason) if !reason.allows_reactivation() => DedupDecision::Skip,
            _ => DedupDecision::Update,
        };
    }

    if job.content_hash == incoming.content_hash {
        DedupDecision::Skip
    } else {
        DedupDecision::Update
    }
}

/// Applies dedup decisions for one scraper run.
///
/// Remembers the identities it has handled so that a posting listed twice
/// in the same run is only stored once.
pub struct Deduplicator {
    jobs: JobRepository,
    seen: HashSet<(String, String)>,
}

impl Deduplicator {
    pub fn new(jobs: JobRepository) -> Self {
        Self {
            jobs,
            seen: HashSet::new(),
        }
    }

    /// Store one posting and report the decision taken.
    pub async fn ingest(
        &mut self,
        incoming: NormalizedJob,
        now: DateTime<Utc>,
    ) -> Result<DedupDecision, DbError> {
        let identity = (incoming.company_id.clone(), incoming.dedup_key.clone());
        if self.seen.contains(&identity) {
            debug!("Duplicate posting within run: {}", incoming.dedup_key);
            return Ok(DedupDecision::Skip);
        }

        let existing = self
            .jobs
            .find_by_dedup_key(&incoming.company_id, &incoming.dedup_key)
            .await?;
        let decision = decide(existing.as_ref(), &incoming);

        match (decision, existing) {
            (DedupDecision::Insert, _) => {
                let slug = self.unique_slug(&incoming.slug).await?;
                let mut job = incoming.into_job(now);
                job.slug = slug;
                self.jobs.insert(&job).await?;
                debug!("Inserted job {} ({})", job.title, job.slug);
            }
            (DedupDecision::Update, Some(mut job)) => {
                incoming.apply_to(&mut job, now);
                self.jobs.update(&job).await?;
                debug!("Updated job {} ({})", job.title, job.slug);
            }
            (_, Some(job)) => {
                self.jobs.touch_seen(&job.id, now).await?;
            }
            (_, None) => {}
        }

        self.seen.insert(identity);
        Ok(decision)
    }

    async fn unique_slug(&self, base: &str) -> Result<String, DbError> {
        if !self.jobs.slug_exists(base).await? {
            return Ok(base.to_string());
        }
        for n in 2..MAX_SLUG_ATTEMPTS + 2 {
            let candidate = format!("{base}-{n}");
            if !self.jobs.slug_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Ok(format!("{base}-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::normalize::normalize_posting;
    use crate::models::{Company, InactiveReason};
    use crate::repository::DbContext;
    use crate::scrapers::RawPosting;
    use tempfile::tempdir;

    async fn setup() -> (tempfile::TempDir, DbContext, Company) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        let company = Company::new("Acme".into(), "https://acme.sg/careers".into());
        ctx.companies().insert(&company).await.unwrap();
        (dir, ctx, company)
    }

    fn posting(company: &Company, description: &str) -> NormalizedJob {
        let raw = RawPosting {
            title: "Software Engineering Intern".into(),
            url: Some("https://acme.sg/careers/123?utm_source=x".into()),
            location: Some("Singapore".into()),
            description: Some(description.into()),
            ..Default::default()
        };
        normalize_posting(&raw, company, &company.careers_url, Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn test_insert_then_skip_then_update() {
        let (_dir, ctx, company) = setup().await;

        let mut dedup = Deduplicator::new(ctx.jobs());
        let first = dedup
            .ingest(posting(&company, "Build things"), Utc::now())
            .await
            .unwrap();
        assert_eq!(first, DedupDecision::Insert);

        // Same posting twice in one run.
        let again = dedup
            .ingest(posting(&company, "Build things"), Utc::now())
            .await
            .unwrap();
        assert_eq!(again, DedupDecision::Skip);

        let mut next_run = Deduplicator::new(ctx.jobs());
        let unchanged = next_run
            .ingest(posting(&company, "Build things"), Utc::now())
            .await
            .unwrap();
        assert_eq!(unchanged, DedupDecision::Skip);

        let mut third_run = Deduplicator::new(ctx.jobs());
        let changed = third_run
            .ingest(posting(&company, "Build better things"), Utc::now())
            .await
            .unwrap();
        assert_eq!(changed, DedupDecision::Update);

        let page = ctx.jobs().search(&Default::default(), 1, 10).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].job.description, "Build better things");
    }

    #[tokio::test]
    async fn test_slug_and_identity_stable_across_updates() {
        let (_dir, ctx, company) = setup().await;
        let incoming = posting(&company, "v1");
        let key = incoming.dedup_key.clone();

        Deduplicator::new(ctx.jobs())
            .ingest(incoming, Utc::now())
            .await
            .unwrap();
        let before = ctx
            .jobs()
            .find_by_dedup_key(&company.id, &key)
            .await
            .unwrap()
            .unwrap();

        Deduplicator::new(ctx.jobs())
            .ingest(posting(&company, "v2"), Utc::now())
            .await
            .unwrap();
        let after = ctx
            .jobs()
            .find_by_dedup_key(&company.id, &key)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(before.id, after.id);
        assert_eq!(before.slug, after.slug);
        assert_eq!(before.first_seen_at, after.first_seen_at);
        assert_ne!(before.content_hash, after.content_hash);
    }

    #[tokio::test]
    async fn test_employer_deactivation_is_kept() {
        let (_dir, ctx, company) = setup().await;
        let incoming = posting(&company, "Build things");
        let key = incoming.dedup_key.clone();
        Deduplicator::new(ctx.jobs())
            .ingest(incoming, Utc::now())
            .await
            .unwrap();

        let job = ctx
            .jobs()
            .find_by_dedup_key(&company.id, &key)
            .await
            .unwrap()
            .unwrap();
        ctx.jobs()
            .set_active(&job.id, false, InactiveReason::Employer)
            .await
            .unwrap();

        let decision = Deduplicator::new(ctx.jobs())
            .ingest(posting(&company, "Build other things"), Utc::now())
            .await
            .unwrap();
        assert_eq!(decision, DedupDecision::Skip);

        let job = ctx.jobs().get(&job.id).await.unwrap().unwrap();
        assert!(!job.is_active);
        assert_eq!(job.inactive_reason, Some(InactiveReason::Employer));
        assert_eq!(job.description, "Build things");
    }

    #[tokio::test]
    async fn test_stale_job_is_reactivated() {
        let (_dir, ctx, company) = setup().await;
        let incoming = posting(&company, "Build things");
        let key = incoming.dedup_key.clone();
        Deduplicator::new(ctx.jobs())
            .ingest(incoming, Utc::now())
            .await
            .unwrap();

        let job = ctx
            .jobs()
            .find_by_dedup_key(&company.id, &key)
            .await
            .unwrap()
            .unwrap();
        ctx.jobs()
            .set_active(&job.id, false, InactiveReason::Stale)
            .await
            .unwrap();

        let decision = Deduplicator::new(ctx.jobs())
            .ingest(posting(&company, "Build things"), Utc::now())
            .await
            .unwrap();
        assert_eq!(decision, DedupDecision::Update);

        let job = ctx.jobs().get(&job.id).await.unwrap().unwrap();
        assert!(job.is_active);
        assert_eq!(job.inactive_reason, None);
    }

    #[test]
    fn test_decide_without_existing() {
        let company = Company::new("Acme".into(), "https://acme.sg/careers".into());
        assert_eq!(
            decide(None, &posting(&company, "x")),
            DedupDecision::Insert
        );
    }
}
