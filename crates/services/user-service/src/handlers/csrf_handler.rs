//! Anti-forgery token handshake.

use axum::{extract::State, response::Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::middleware::CSRF_COOKIE;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CsrfTokenResponse {
    pub token: String,
}

/// Issue the anti-forgery token.
///
/// A token already held in the cookie is reused, so concurrent tabs keep
/// working. The cookie is readable by scripts; clients echo it back in
/// the `X-XSRF-TOKEN` header.
#[utoipa::path(
    get,
    path = "/api/csrf-token",
    tag = "Status",
    responses((status = 200, description = "Token issued and cookie set", body = CsrfTokenResponse))
)]
pub async fn csrf_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<CsrfTokenResponse>) {
    let token = jar
        .get(CSRF_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(generate_token);

    let cookie = Cookie::build((CSRF_COOKIE, token.clone()))
        .path("/")
        .same_site(SameSite::Lax)
        .http_only(false)
        .secure(state.config.csrf.cookie_secure)
        .build();

    (jar.add(cookie), Json(CsrfTokenResponse { token }))
}

fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}
