//! Scraper trigger and run history.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::super::AppState;
use super::helpers::{internal_error, json_error, PageParams};
use crate::ingest::IngestError;
use crate::models::RunTrigger;

/// Run the pipeline now and report what it did.
pub async fn trigger_scraper(State(state): State<AppState>) -> Response {
    match state.orchestrator.run(RunTrigger::Manual).await {
        Ok(summary) => Json(json!({
            "jobsScraped": summary.counts.jobs_found,
            "newJobs": summary.counts.jobs_added,
            "companiesUpdated": summary.counts.companies_updated,
            "message": summary.message(),
            "status": summary.status.as_str(),
        }))
        .into_response(),
        Err(IngestError::RunInProgress) => json_error(
            StatusCode::CONFLICT,
            "A scraper run is already in progress",
        ),
        Err(e) => internal_error("Scraper run failed", e),
    }
}

/// Paginated scraper runs, newest first.
pub async fn list_scraper_logs(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Response {
    let (page, limit) = params.resolve();

    match state.ctx.scraper_logs().list(page, limit).await {
        Ok(result) => {
            let total_pages = result.total_pages();
            Json(json!({
                "logs": result.items,
                "total": result.total,
                "page": result.page,
                "limit": result.limit,
                "totalPages": total_pages,
            }))
            .into_response()
        }
        Err(e) => internal_error("Failed to load scraper logs", e),
    }
}
