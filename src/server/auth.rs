//! Bearer-token gate for admin routes.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use super::AppState;

/// Admin credentials checked on every admin request.
#[derive(Clone)]
pub struct AdminAuth {
    token: Option<String>,
    insecure: bool,
}

impl AdminAuth {
    /// `insecure` opens the admin routes when no token is configured.
    pub fn new(token: Option<String>, insecure: bool) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
            insecure,
        }
    }

    /// Whether admin routes can be reached at all.
    pub fn is_enabled(&self) -> bool {
        self.token.is_some() || self.insecure
    }

    fn check(&self, headers: &HeaderMap) -> Result<(), (StatusCode, &'static str)> {
        let Some(ref expected) = self.token else {
            if self.insecure {
                return Ok(());
            }
            return Err((
                StatusCode::SERVICE_UNAVAILABLE,
                "Admin API is disabled: no admin token configured",
            ));
        };

        let provided = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim);

        match provided {
            Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes()) => Ok(()),
            Some(_) => Err((StatusCode::UNAUTHORIZED, "Invalid admin token")),
            None => Err((StatusCode::UNAUTHORIZED, "Missing bearer token")),
        }
    }
}

impl std::fmt::Debug for AdminAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAuth")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("insecure", &self.insecure)
            .finish()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware rejecting admin requests without a valid token.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    match state.admin.check(request.headers()) {
        Ok(()) => next.run(request).await,
        Err((status, message)) => {
            debug!("Admin request to {} rejected: {}", request.uri().path(), message);
            (status, Json(serde_json::json!({ "error": message }))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_check_token() {
        let auth = AdminAuth::new(Some("s3cret".into()), false);
        assert!(auth.check(&headers("Bearer s3cret")).is_ok());
        assert_eq!(
            auth.check(&headers("Bearer nope")).unwrap_err().0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            auth.check(&headers("s3cret")).unwrap_err().0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            auth.check(&HeaderMap::new()).unwrap_err().0,
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_empty_token_is_no_token() {
        let auth = AdminAuth::new(Some(String::new()), false);
        assert!(!auth.is_enabled());
        assert_eq!(
            auth.check(&HeaderMap::new()).unwrap_err().0,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert!(AdminAuth::new(None, true).check(&HeaderMap::new()).is_ok());
    }
}
