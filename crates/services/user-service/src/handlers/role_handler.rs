//! Role handlers.

use axum::{extract::State, response::Json, routing::get, Router};

use common::AppResult;
use domain::Role;

use crate::state::AppState;

pub fn role_routes() -> Router<AppState> {
    Router::new().route("/", get(list_roles))
}

/// List every role
#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "Roles",
    responses(
        (status = 200, description = "All roles ordered by id", body = Vec<Role>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_roles(State(state): State<AppState>) -> AppResult<Json<Vec<Role>>> {
    let roles = state
        .role_service
        .list_roles()
        .await
        .inspect_err(|e| super::log_failure("list_roles", e))?;

    Ok(Json(roles))
}
