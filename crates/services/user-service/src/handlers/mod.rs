//! HTTP request handlers.

pub mod csrf_handler;
pub mod health_handler;
pub mod role_handler;
pub mod user_handler;

pub use csrf_handler::csrf_token;
pub use health_handler::{api_status, health_check};
pub use role_handler::role_routes;
pub use user_handler::user_routes;

use common::AppError;

/// Log a failed request: client errors at warn, server errors at error.
pub(crate) fn log_failure(action: &'static str, err: &AppError) {
    if err.status().is_server_error() {
        tracing::error!(action, code = err.code(), error = ?err, "Request failed");
    } else {
        tracing::warn!(action, code = err.code(), error = %err, "Request rejected");
    }
}
