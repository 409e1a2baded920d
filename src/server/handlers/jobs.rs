//! Public job listings and admin job status.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::super::AppState;
use super::helpers::{bad_body, internal_error, json_error, non_empty, PageParams};
use crate::models::{InactiveReason, JobFilter, WorkArrangement};

/// Query parameters for job search.
#[derive(Debug, Deserialize)]
pub struct JobSearchParams {
    pub q: Option<String>,
    pub location: Option<String>,
    pub arrangement: Option<String>,
    /// Company id.
    pub company: Option<String>,
    #[serde(flatten)]
    pub paging: PageParams,
}

/// Search active jobs, newest first.
pub async fn search_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobSearchParams>,
) -> Response {
    let arrangement = match non_empty(params.arrangement) {
        Some(a) => match WorkArrangement::from_str(&a) {
            Some(a) => Some(a),
            None => {
                return json_error(
                    StatusCode::BAD_REQUEST,
                    format!("Unknown work arrangement '{}'", a),
                )
            }
        },
        None => None,
    };

    let filter = JobFilter {
        query: non_empty(params.q),
        location: non_empty(params.location),
        arrangement,
        company_id: non_empty(params.company),
    };
    let (page, limit) = params.paging.resolve();

    match state.ctx.jobs().search(&filter, page, limit).await {
        Ok(result) => {
            let total_pages = result.total_pages();
            Json(json!({
                "jobs": result.items,
                "total": result.total,
                "page": result.page,
                "limit": result.limit,
                "totalPages": total_pages,
            }))
            .into_response()
        }
        Err(e) => internal_error("Failed to search jobs", e),
    }
}

/// One job by slug.
pub async fn job_detail(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    match state.ctx.jobs().get_listing_by_slug(&slug).await {
        Ok(Some(listing)) => Json(json!({ "job": listing })).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "Job not found"),
        Err(e) => internal_error("Failed to load job", e),
    }
}

/// Body of `PATCH /api/admin/jobs`.
#[derive(Debug, Deserialize)]
pub struct JobStatusUpdate {
    pub id: String,
    pub is_active: bool,
    /// Why the job is being deactivated; defaults to `employer`.
    pub reason: Option<InactiveReason>,
}

/// Activate or deactivate a job by hand.
pub async fn update_job_status(
    State(state): State<AppState>,
    body: Result<Json<JobStatusUpdate>, JsonRejection>,
) -> Response {
    let Json(update) = match body {
        Ok(b) => b,
        Err(rejection) => return bad_body(rejection),
    };

    let reason = update.reason.unwrap_or(InactiveReason::Employer);
    let jobs = state.ctx.jobs();

    match jobs.set_active(&update.id, update.is_active, reason).await {
        Ok(true) => {}
        Ok(false) => return json_error(StatusCode::NOT_FOUND, "Job not found"),
        Err(e) => return internal_error("Failed to update job", e),
    }

    tracing::info!(
        "Job {} {}",
        update.id,
        if update.is_active {
            "reactivated".to_string()
        } else {
            format!("deactivated ({})", reason.as_str())
        }
    );

    match jobs.get(&update.id).await {
        Ok(Some(job)) => Json(json!({ "job": job })).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "Job not found"),
        Err(e) => internal_error("Failed to load job", e),
    }
}
