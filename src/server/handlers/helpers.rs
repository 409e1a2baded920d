//! Helper types and utility functions for handlers.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// `{ "error": message }` with the given status.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// 500 for an unexpected failure, logged.
pub fn internal_error(context: &str, err: impl std::fmt::Display) -> Response {
    tracing::error!("{}: {}", context, err);
    json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("{}: {}", context, err))
}

/// 400 for a request body that is not the expected JSON.
pub fn bad_body(rejection: JsonRejection) -> Response {
    json_error(StatusCode::BAD_REQUEST, rejection.body_text())
}

/// Raw paging parameters. Values that do not parse fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageParams {
    /// Page number (min 1) and page size (1..=100, default 20).
    pub fn resolve(&self) -> (i64, i64) {
        let page = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .max(1);
        let limit = self
            .limit
            .as_deref()
            .and_then(|l| l.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, limit)
    }
}

/// Treat empty query values as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<&str>, limit: Option<&str>) -> PageParams {
        PageParams {
            page: page.map(String::from),
            limit: limit.map(String::from),
        }
    }

    #[test]
    fn test_page_params_clamping() {
        assert_eq!(params(None, None).resolve(), (1, 20));
        assert_eq!(params(Some("0"), Some("0")).resolve(), (1, 1));
        assert_eq!(params(Some("-3"), Some("1000")).resolve(), (1, 100));
        assert_eq!(params(Some("4"), Some("50")).resolve(), (4, 50));
        assert_eq!(params(Some("abc"), Some("")).resolve(), (1, 20));
        assert_eq!(
            params(Some("9223372036854775807"), Some("100")).resolve(),
            (i64::MAX, 100)
        );
    }
}
