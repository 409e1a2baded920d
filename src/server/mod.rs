//! HTTP API for job listings, the contact form and scraper administration.
//!
//! Public routes:
//! - `GET /api/jobs`, `GET /api/jobs/:slug`
//! - `POST /api/contact`
//! - `GET /healthz`
//!
//! Admin routes (bearer token):
//! - `POST /api/scraper`
//! - `GET /api/admin/scraper-logs`
//! - `GET|POST|PATCH|DELETE /api/admin/companies`
//! - `PATCH /api/admin/jobs`

mod auth;
mod handlers;
mod routes;

pub use auth::AdminAuth;
pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::ingest::Orchestrator;
use crate::repository::DbContext;
use crate::scheduler::start_scheduler;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub ctx: DbContext,
    pub orchestrator: Arc<Orchestrator>,
    pub admin: AdminAuth,
}

impl AppState {
    pub fn new(ctx: DbContext, orchestrator: Arc<Orchestrator>, admin: AdminAuth) -> Self {
        Self {
            ctx,
            orchestrator,
            admin,
        }
    }
}

/// Options for `serve` that come from the command line.
#[derive(Debug, Clone, Default)]
pub struct ServeOptions {
    /// Run the daily scheduler alongside the server.
    pub schedule: bool,
    /// Allow admin routes without a configured token.
    pub insecure_admin: bool,
}

/// Start the web server.
pub async fn serve(
    settings: &Settings,
    host: &str,
    port: u16,
    options: ServeOptions,
) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    let fetcher = Arc::new(settings.http_client()?);
    let orchestrator = Arc::new(Orchestrator::new(
        ctx.clone(),
        fetcher,
        settings.pipeline_config(),
    ));

    let admin = AdminAuth::new(settings.admin_token.clone(), options.insecure_admin);
    if !admin.is_enabled() {
        tracing::warn!(
            "No admin token configured; admin routes will answer 503. Set {} or admin_token.",
            crate::config::ADMIN_TOKEN_ENV
        );
    } else if options.insecure_admin && settings.admin_token.is_none() {
        tracing::warn!("Admin routes are open to anyone (--insecure-admin)");
    }

    // Held for the lifetime of the server.
    let _scheduler = if options.schedule {
        Some(start_scheduler(orchestrator.clone(), &settings.schedule).await?)
    } else {
        None
    };

    let state = AppState::new(ctx, orchestrator, admin);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use serde_json::{json, Value};
    use tempfile::tempdir;
    use tower::ServiceExt;

    use crate::ingest::{normalize_posting, PipelineConfig};
    use crate::models::{Company, RunTrigger};
    use crate::scrapers::{FetchError, FetchedPage, PageFetcher, RawPosting};

    const TOKEN: &str = "test-token";

    struct StaticFetcher(HashMap<String, String>);

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
            match self.0.get(url) {
                Some(body) => Ok(FetchedPage {
                    url: url.to_string(),
                    status: 200,
                    content_type: Some("application/json".into()),
                    body: body.clone(),
                }),
                None => Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }

    async fn setup_app(admin: AdminAuth) -> (axum::Router, DbContext, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();

        let mut pages = HashMap::new();
        pages.insert(
            "https://acme.sg/careers".to_string(),
            json!({"jobs": [{
                "title": "Software Engineering Intern",
                "absolute_url": "https://acme.sg/careers/1",
                "location": {"name": "Singapore"},
                "content": "Help us build things for six months."
            }]})
            .to_string(),
        );
        let orchestrator = Arc::new(Orchestrator::new(
            ctx.clone(),
            Arc::new(StaticFetcher(pages)),
            PipelineConfig::default(),
        ));

        let app = create_router(AppState::new(ctx.clone(), orchestrator, admin));
        (app, ctx, dir)
    }

    fn admin() -> AdminAuth {
        AdminAuth::new(Some(TOKEN.to_string()), false)
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", TOKEN));
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn seed_job(ctx: &DbContext, title: &str) -> String {
        let company = match ctx.companies().get_by_name("Acme").await.unwrap() {
            Some(c) => c,
            None => {
                let c = Company::new("Acme".into(), "https://acme.sg/careers".into());
                ctx.companies().insert(&c).await.unwrap();
                c
            }
        };
        let raw = RawPosting {
            title: title.into(),
            description: Some("Work on our data platform with the analytics team.".into()),
            ..Default::default()
        };
        let job = normalize_posting(&raw, &company, &company.careers_url, Utc::now())
            .unwrap()
            .into_job(Utc::now());
        ctx.jobs().insert(&job).await.unwrap();
        job.slug
    }

    #[tokio::test]
    async fn test_healthz() {
        let (app, _ctx, _dir) = setup_app(admin()).await;
        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["scraperRunning"], false);
    }

    #[tokio::test]
    async fn test_admin_requires_token() {
        let (app, _ctx, _dir) = setup_app(admin()).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/admin/companies")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/admin/companies")
                    .header("authorization", "Bearer wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(request("GET", "/api/admin/companies", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_disabled_without_token() {
        let (app, _ctx, _dir) = setup_app(AdminAuth::new(None, false)).await;
        let response = app
            .oneshot(request("POST", "/api/scraper", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = json_body(response).await;
        assert!(json["error"].is_string());

        let (app, _ctx, _dir) = setup_app(AdminAuth::new(None, true)).await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/admin/scraper-logs")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_company_crud() {
        let (app, _ctx, _dir) = setup_app(admin()).await;

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/admin/companies",
                Some(json!({"name": "Acme", "careers_url": "https://acme.sg/careers"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        let id = created["company"]["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/admin/companies",
                Some(json!({"name": "Bad", "careers_url": "not-a-url"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["field"], "careers_url");

        let response = app
            .clone()
            .oneshot(request(
                "PATCH",
                "/api/admin/companies",
                Some(json!({"id": id, "industry": "Fintech", "is_enabled": false})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated = json_body(response).await;
        assert_eq!(updated["company"]["industry"], "Fintech");
        assert_eq!(updated["company"]["is_enabled"], false);

        let response = app
            .clone()
            .oneshot(request(
                "PATCH",
                "/api/admin/companies",
                Some(json!({"id": "missing", "industry": "x"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(request("GET", "/api/admin/companies", None))
            .await
            .unwrap();
        let listed = json_body(response).await;
        assert_eq!(listed["companies"].as_array().unwrap().len(), 1);

        let response = app
            .clone()
            .oneshot(request(
                "DELETE",
                &format!("/api/admin/companies?id={}", id),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["success"], true);

        let response = app
            .oneshot(request(
                "DELETE",
                &format!("/api/admin/companies?id={}", id),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_company_rename_conflict() {
        let (app, ctx, _dir) = setup_app(admin()).await;
        seed_job(&ctx, "Finance Intern").await;
        let globex = Company::new("Globex".into(), "https://globex.sg/jobs".into());
        ctx.companies().insert(&globex).await.unwrap();

        let response = app
            .clone()
            .oneshot(request(
                "PATCH",
                "/api/admin/companies",
                Some(json!({"id": globex.id, "name": "ACME"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            ctx.companies().get(&globex.id).await.unwrap().unwrap().name,
            "Globex"
        );

        // Re-casing its own name is not a conflict.
        let response = app
            .clone()
            .oneshot(request(
                "PATCH",
                "/api/admin/companies",
                Some(json!({"id": globex.id, "name": "GLOBEX"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request("GET", "/api/admin/companies", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let listed = json_body(response).await;
        let acme = listed["companies"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["name"] == "Acme")
            .unwrap()
            .clone();
        assert_eq!(acme["active_jobs"], 1);
    }

    #[tokio::test]
    async fn test_trigger_scraper_and_list_logs() {
        let (app, ctx, _dir) = setup_app(admin()).await;
        ctx.companies()
            .insert(&Company::new(
                "Acme".into(),
                "https://acme.sg/careers".into(),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(request("POST", "/api/scraper", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["jobsScraped"], 1);
        assert_eq!(json["newJobs"], 1);
        assert_eq!(json["companiesUpdated"], 1);
        assert!(json["message"].as_str().unwrap().contains("1 new"));

        let response = app
            .oneshot(request("GET", "/api/admin/scraper-logs?page=0&limit=500", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["page"], 1);
        assert_eq!(json["limit"], 100);
        assert_eq!(json["total"], 1);
        assert_eq!(json["totalPages"], 1);
        assert_eq!(json["logs"][0]["status"], "completed");
        assert_eq!(json["logs"][0]["trigger"], "manual");
    }

    /// Never finishes, so a run holds the lock until aborted.
    struct PendingFetcher;

    #[async_trait]
    impl PageFetcher for PendingFetcher {
        async fn fetch(&self, _url: &str) -> Result<FetchedPage, FetchError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_scraper_conflict_while_running() {
        let (_app, ctx, _dir) = setup_app(admin()).await;
        ctx.companies()
            .insert(&Company::new("Slow".into(), "https://slow.sg/careers".into()))
            .await
            .unwrap();

        let orchestrator = Arc::new(Orchestrator::new(
            ctx.clone(),
            Arc::new(PendingFetcher),
            PipelineConfig::default(),
        ));
        let app = create_router(AppState::new(ctx.clone(), orchestrator.clone(), admin()));

        let running = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.run(RunTrigger::Scheduled).await })
        };
        while !orchestrator.is_running() {
            tokio::task::yield_now().await;
        }

        let response = app
            .oneshot(request("POST", "/api/scraper", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(json_body(response).await["error"].is_string());

        running.abort();
    }

    #[tokio::test]
    async fn test_job_search_and_detail() {
        let (app, ctx, _dir) = setup_app(admin()).await;
        let slug = seed_job(&ctx, "Data Analyst Intern").await;
        seed_job(&ctx, "Marketing Intern").await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/jobs?q=data%20analyst")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["total"], 1);
        assert_eq!(json["jobs"][0]["company_name"], "Acme");
        assert!(json["jobs"][0].get("content_hash").is_none());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/jobs?arrangement=teleport")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/jobs/{}", slug))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["job"]["slug"], slug);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/jobs/no-such-job")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_job_search_far_page() {
        let (app, ctx, _dir) = setup_app(admin()).await;
        seed_job(&ctx, "Data Analyst Intern").await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/jobs?page=9223372036854775807&limit=100")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["total"], 1);
        assert!(json["jobs"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_deactivate_job() {
        let (app, ctx, _dir) = setup_app(admin()).await;
        let slug = seed_job(&ctx, "Design Intern").await;
        let job = ctx.jobs().get_listing_by_slug(&slug).await.unwrap().unwrap();

        let response = app
            .clone()
            .oneshot(request(
                "PATCH",
                "/api/admin/jobs",
                Some(json!({"id": job.job.id, "is_active": false})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["job"]["is_active"], false);
        assert_eq!(json["job"]["inactive_reason"], "employer");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/jobs")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(json_body(response).await["total"], 0);
    }

    #[tokio::test]
    async fn test_contact_form() {
        let (app, ctx, _dir) = setup_app(admin()).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/contact")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({"name": "", "email": "nope", "message": "short"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert!(json["fields"]["name"].is_string());
        assert!(json["fields"]["email"].is_string());
        assert!(json["fields"]["message"].is_string());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/contact")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({
                            "name": "Mei Ling",
                            "email": "mei@example.sg",
                            "message": "Could you list more hardware internships?"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(ctx.contacts().recent(10).await.unwrap().len(), 1);
    }
}
