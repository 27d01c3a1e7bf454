//! User handlers.

use std::borrow::Cow;
use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use common::{AppError, AppResult};
use domain::{UserResponse, UserSummary, UsersByRole};

use super::log_failure;
use crate::extractors::ValidatedJson;
use crate::service::{CreateUserInput, UpdateUserInput};
use crate::state::AppState;
use crate::types::MessageResponse;

/// User creation request with validation
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(
        required(message = "The full name field is required."),
        custom(function = "full_name_not_blank"),
        length(max = 255, message = "The full name may not be greater than 255 characters.")
    )]
    #[schema(example = "Jane Doe")]
    pub full_name: Option<String>,

    #[validate(
        required(message = "The email field is required."),
        email(message = "The email must be a valid email address."),
        length(max = 255, message = "The email may not be greater than 255 characters.")
    )]
    #[schema(example = "jane@example.com")]
    pub email: Option<String>,

    /// Optional; a random credential is stored when omitted
    #[validate(length(min = 8, message = "The password must be at least 8 characters."))]
    #[schema(example = "password123")]
    pub password: Option<String>,

    #[validate(
        required(message = "Please select at least one role."),
        length(min = 1, message = "Please select at least one role.")
    )]
    #[schema(example = json!([1, 2]))]
    pub roles: Option<Vec<i32>>,
}

/// Partial user update. Omitted fields keep their stored value.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(
        custom(function = "full_name_not_blank"),
        length(max = 255, message = "The full name may not be greater than 255 characters.")
    )]
    #[schema(example = "Jane Doe")]
    pub full_name: Option<String>,

    #[validate(
        email(message = "The email must be a valid email address."),
        length(max = 255, message = "The email may not be greater than 255 characters.")
    )]
    pub email: Option<String>,

    /// Omit to keep the current password
    #[validate(length(min = 8, message = "The password must be at least 8 characters."))]
    pub password: Option<String>,

    /// Replaces the full set of roles
    #[validate(length(min = 1, message = "Please select at least one role."))]
    #[schema(example = json!([3]))]
    pub roles: Option<Vec<i32>>,
}

/// A full name made only of whitespace counts as missing.
fn full_name_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank")
            .with_message(Cow::Borrowed("The full name field is required.")));
    }
    Ok(())
}

/// Role ids to attach or detach
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RoleIdsRequest {
    #[validate(
        required(message = "Please select at least one role."),
        length(min = 1, message = "Please select at least one role.")
    )]
    #[schema(example = json!([2]))]
    pub roles: Option<Vec<i32>>,
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/by-role", get(list_users_by_role))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/roles", post(attach_roles).delete(detach_roles))
}

/// List all users with their roles
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Flat list of users", body = Vec<UserResponse>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = state
        .user_service
        .list_users()
        .await
        .inspect_err(|e| log_failure("list_users", e))?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Users grouped by role name
#[utoipa::path(
    get,
    path = "/api/users/by-role",
    tag = "Users",
    responses(
        (status = 200, description = "Role name mapped to its members", body = BTreeMap<String, Vec<UserSummary>>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_users_by_role(State(state): State<AppState>) -> AppResult<Json<UsersByRole>> {
    let grouped = state
        .user_service
        .list_users_by_role()
        .await
        .inspect_err(|e| log_failure("list_users_by_role", e))?;

    Ok(Json(grouped))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User with roles", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .user_service
        .get_user(id)
        .await
        .inspect_err(|e| log_failure("get_user", e))?;

    Ok(Json(UserResponse::from(user)))
}

/// Create a user and attach its roles
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    security(("csrf_token" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 419, description = "Anti-forgery token mismatch"),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    tracing::info!(email = ?payload.email, roles = ?payload.roles, "Creating user");

    let input = CreateUserInput {
        full_name: payload.full_name.unwrap_or_default(),
        email: payload.email.unwrap_or_default(),
        password: payload.password,
        roles: payload.roles.unwrap_or_default(),
    };

    let user = state
        .user_service
        .create_user(input)
        .await
        .inspect_err(|e| log_failure("create_user", e))?;

    tracing::info!(user_id = user.id, "User created successfully");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Update a user; `roles` replaces every association
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    security(("csrf_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 419, description = "Anti-forgery token mismatch"),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    tracing::info!(user_id = id, roles = ?payload.roles, "Updating user");

    let input = UpdateUserInput {
        full_name: payload.full_name,
        email: payload.email,
        password: payload.password,
        roles: payload.roles,
    };

    let user = state
        .user_service
        .update_user(id, input)
        .await
        .inspect_err(|e| log_failure("update_user", e))?;

    tracing::info!(user_id = user.id, "User updated successfully");
    Ok(Json(UserResponse::from(user)))
}

/// Delete a user and its role associations
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    security(("csrf_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 404, description = "User not found"),
        (status = 419, description = "Anti-forgery token mismatch"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    tracing::info!(user_id = id, "Deleting user");

    state
        .user_service
        .delete_user(id)
        .await
        .inspect_err(|e| log_failure("delete_user", e))?;

    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// Attach roles to a user
#[utoipa::path(
    post,
    path = "/api/users/{id}/roles",
    tag = "Users",
    security(("csrf_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = RoleIdsRequest,
    responses(
        (status = 200, description = "Roles attached", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn attach_roles(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<RoleIdsRequest>,
) -> AppResult<Json<UserResponse>> {
    let role_ids = required_roles(payload)?;
    tracing::info!(user_id = id, roles = ?role_ids, "Attaching roles");

    let user = state
        .user_service
        .attach_roles(id, role_ids)
        .await
        .inspect_err(|e| log_failure("attach_roles", e))?;

    Ok(Json(UserResponse::from(user)))
}

/// Detach roles from a user
#[utoipa::path(
    delete,
    path = "/api/users/{id}/roles",
    tag = "Users",
    security(("csrf_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = RoleIdsRequest,
    responses(
        (status = 200, description = "Roles detached", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn detach_roles(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<RoleIdsRequest>,
) -> AppResult<Json<UserResponse>> {
    let role_ids = required_roles(payload)?;
    tracing::info!(user_id = id, roles = ?role_ids, "Detaching roles");

    let user = state
        .user_service
        .detach_roles(id, role_ids)
        .await
        .inspect_err(|e| log_failure("detach_roles", e))?;

    Ok(Json(UserResponse::from(user)))
}

fn required_roles(payload: RoleIdsRequest) -> AppResult<Vec<i32>> {
    payload
        .roles
        .ok_or_else(|| AppError::field(domain::FIELD_ROLES, domain::MSG_ROLES_REQUIRED))
}
