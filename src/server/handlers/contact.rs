//! Contact form endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::super::AppState;
use super::helpers::{bad_body, internal_error};
use crate::models::ContactForm;

/// Validate and store a contact form submission.
pub async fn submit_contact(
    State(state): State<AppState>,
    body: Result<Json<ContactForm>, JsonRejection>,
) -> Response {
    let Json(form) = match body {
        Ok(b) => b,
        Err(rejection) => return bad_body(rejection),
    };

    if let Err(fields) = form.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Please correct the highlighted fields", "fields": fields })),
        )
            .into_response();
    }

    let message = form.into_message();
    match state.ctx.contacts().insert(&message).await {
        Ok(()) => {
            tracing::info!("Contact message received from {}", message.email);
            (StatusCode::CREATED, Json(json!({ "success": true }))).into_response()
        }
        Err(e) => internal_error("Failed to save message", e),
    }
}
