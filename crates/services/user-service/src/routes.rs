//! Route configuration.

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::UserServiceConfig;
use crate::handlers::{api_status, csrf_token, health_check, role_routes, user_routes};
use crate::middleware::{csrf_middleware, CSRF_HEADER, CSRF_HEADER_ALT};
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        // Health check (outside the token check)
        .route("/health", get(health_check))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest(
            "/api",
            api_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                csrf_middleware,
            )),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api_status))
        .route("/csrf-token", get(csrf_token))
        .nest("/roles", role_routes())
        .nest("/users", user_routes())
}

/// Credentialed CORS for the configured origin, otherwise any origin
/// without credentials.
fn cors_layer(config: &UserServiceConfig) -> CorsLayer {
    let Some(origin) = config.cors_allowed_origin.as_deref() else {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    };

    match origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::ACCEPT,
                header::CONTENT_TYPE,
                HeaderName::from_static(CSRF_HEADER),
                HeaderName::from_static(CSRF_HEADER_ALT),
                HeaderName::from_static("x-requested-with"),
            ]),
        Err(_) => {
            tracing::warn!(origin, "Invalid CORS_ALLOWED_ORIGIN, allowing any origin");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}
