//! Anti-forgery (double-submit token) middleware.
//!
//! `GET /api/csrf-token` stores a random token in the `XSRF-TOKEN` cookie.
//! Every state-changing request must echo that value back in a header.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use subtle::ConstantTimeEq;

use common::AppError;

use crate::state::AppState;

/// Cookie holding the token
pub const CSRF_COOKIE: &str = "XSRF-TOKEN";
/// Header a client echoes the cookie value in
pub const CSRF_HEADER: &str = "x-xsrf-token";
/// Accepted alias of [`CSRF_HEADER`]
pub const CSRF_HEADER_ALT: &str = "x-csrf-token";

/// Reject mutating requests whose header token does not match the cookie.
pub async fn csrf_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.config.csrf.enabled || !is_mutating(request.method()) {
        return Ok(next.run(request).await);
    }

    let expected = jar.get(CSRF_COOKIE).map(|cookie| cookie.value());
    let provided = header_token(request.headers());
    let valid = match (expected, provided) {
        (Some(expected), Some(provided)) => tokens_match(expected, provided),
        _ => false,
    };

    if !valid {
        tracing::warn!(
            method = %request.method(),
            path = %request.uri().path(),
            has_cookie = expected.is_some(),
            has_header = provided.is_some(),
            "CSRF token mismatch"
        );
        return Err(AppError::CsrfMismatch);
    }

    Ok(next.run(request).await)
}

fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn header_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(CSRF_HEADER)
        .or_else(|| headers.get(CSRF_HEADER_ALT))
        .and_then(|value| value.to_str().ok())
}

/// Constant-time comparison; empty tokens never match.
pub fn tokens_match(expected: &str, provided: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}
