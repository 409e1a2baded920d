//! Router configuration for the web server.

use axum::{
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::auth::require_admin;
use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/api/scraper", post(handlers::trigger_scraper))
        .route("/api/admin/scraper-logs", get(handlers::list_scraper_logs))
        .route(
            "/api/admin/companies",
            get(handlers::list_companies)
                .post(handlers::create_company)
                .patch(handlers::update_company)
                .delete(handlers::delete_company),
        )
        .route("/api/admin/jobs", patch(handlers::update_job_status))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/healthz", get(handlers::health))
        .route("/api/jobs", get(handlers::search_jobs))
        .route("/api/jobs/:slug", get(handlers::job_detail))
        .route("/api/contact", post(handlers::submit_contact))
        .merge(admin)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
