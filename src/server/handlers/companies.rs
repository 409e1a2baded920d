//! Company registry administration.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::super::AppState;
use super::helpers::{bad_body, internal_error, json_error};
use crate::models::{validate_company, Company, CompanyPatch, NewCompany};

/// A company with its number of active listings.
#[derive(Debug, Serialize)]
struct CompanyWithCounts {
    #[serde(flatten)]
    company: Company,
    active_jobs: i64,
}

#[derive(Debug, Deserialize)]
pub struct IdParams {
    pub id: Option<String>,
}

fn validation_error(field: &str, message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message, "field": field })),
    )
        .into_response()
}

/// All companies ordered by name.
pub async fn list_companies(State(state): State<AppState>) -> Response {
    let companies = match state.ctx.companies().get_all().await {
        Ok(c) => c,
        Err(e) => return internal_error("Failed to load companies", e),
    };
    let counts = match state.ctx.jobs().count_active_by_company().await {
        Ok(c) => c,
        Err(e) => return internal_error("Failed to count active jobs", e),
    };

    let companies: Vec<_> = companies
        .into_iter()
        .map(|company| CompanyWithCounts {
            active_jobs: counts.get(&company.id).copied().unwrap_or(0),
            company,
        })
        .collect();

    Json(json!({ "companies": companies })).into_response()
}

/// Register a new company.
pub async fn create_company(
    State(state): State<AppState>,
    body: Result<Json<NewCompany>, JsonRejection>,
) -> Response {
    let Json(input) = match body {
        Ok(b) => b,
        Err(rejection) => return bad_body(rejection),
    };

    let company = input.into_company();
    if let Err((field, message)) = validate_company(&company) {
        return validation_error(field, message);
    }

    let repo = state.ctx.companies();
    match repo.get_by_name(&company.name).await {
        Ok(Some(_)) => {
            return json_error(
                StatusCode::CONFLICT,
                format!("A company named '{}' already exists", company.name),
            )
        }
        Ok(None) => {}
        Err(e) => return internal_error("Failed to check company name", e),
    }

    match repo.insert(&company).await {
        Ok(()) => {
            tracing::info!("Added company {} ({})", company.name, company.id);
            (StatusCode::CREATED, Json(json!({ "company": company }))).into_response()
        }
        Err(e) => internal_error("Failed to create company", e),
    }
}

/// Apply a partial update. The body carries the company `id` next to the changed fields.
pub async fn update_company(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(mut body) = match body {
        Ok(b) => b,
        Err(rejection) => return bad_body(rejection),
    };

    let id = match body.as_object_mut().and_then(|o| o.remove("id")) {
        Some(Value::String(id)) => id,
        _ => return validation_error("id", "Company id is required".to_string()),
    };
    let patch: CompanyPatch = match serde_json::from_value(body) {
        Ok(p) => p,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, format!("Invalid update: {}", e)),
    };

    let repo = state.ctx.companies();
    let mut company = match repo.get(&id).await {
        Ok(Some(c)) => c,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "Company not found"),
        Err(e) => return internal_error("Failed to load company", e),
    };

    let previous_name = company.name.clone();
    patch.apply(&mut company);
    if let Err((field, message)) = validate_company(&company) {
        return validation_error(field, message);
    }

    if company.name != previous_name {
        match repo.get_by_name(&company.name).await {
            Ok(Some(other)) if other.id != company.id => {
                return json_error(
                    StatusCode::CONFLICT,
                    format!("A company named '{}' already exists", company.name),
                )
            }
            Ok(_) => {}
            Err(e) => return internal_error("Failed to check company name", e),
        }
    }

    match repo.update(&company).await {
        Ok(true) => Json(json!({ "company": company })).into_response(),
        Ok(false) => json_error(StatusCode::NOT_FOUND, "Company not found"),
        Err(e) => internal_error("Failed to update company", e),
    }
}

/// Remove a company and its jobs.
pub async fn delete_company(
    State(state): State<AppState>,
    Query(params): Query<IdParams>,
) -> Response {
    let Some(id) = params.id.filter(|id| !id.is_empty()) else {
        return validation_error("id", "Company id is required".to_string());
    };

    match state.ctx.companies().delete(&id).await {
        Ok(true) => {
            tracing::info!("Deleted company {}", id);
            Json(json!({ "success": true })).into_response()
        }
        Ok(false) => json_error(StatusCode::NOT_FOUND, "Company not found"),
        Err(e) => internal_error("Failed to delete company", e),
    }
}
