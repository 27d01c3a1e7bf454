//! OpenAPI documentation.

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use domain::{Role, UserResponse, UserSummary};

use crate::handlers::csrf_handler::CsrfTokenResponse;
use crate::handlers::health_handler::{HealthResponse, ServiceHealth};
use crate::handlers::user_handler::{CreateUserRequest, RoleIdsRequest, UpdateUserRequest};
use crate::types::MessageResponse;

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health_handler::api_status,
        crate::handlers::health_handler::health_check,
        crate::handlers::csrf_handler::csrf_token,
        crate::handlers::role_handler::list_roles,
        crate::handlers::user_handler::list_users,
        crate::handlers::user_handler::list_users_by_role,
        crate::handlers::user_handler::get_user,
        crate::handlers::user_handler::create_user,
        crate::handlers::user_handler::update_user,
        crate::handlers::user_handler::delete_user,
        crate::handlers::user_handler::attach_roles,
        crate::handlers::user_handler::detach_roles,
    ),
    components(
        schemas(
            Role,
            UserResponse,
            UserSummary,
            CreateUserRequest,
            UpdateUserRequest,
            RoleIdsRequest,
            MessageResponse,
            CsrfTokenResponse,
            HealthResponse,
            ServiceHealth,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Users", description = "User management endpoints"),
        (name = "Roles", description = "Role listing"),
        (name = "Status", description = "Health, status and anti-forgery token"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "csrf_token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-XSRF-TOKEN"))),
            );
        }
    }
}
