//! Service layer - business logic between handlers and repositories.

mod role_service;
mod user_service;

pub use role_service::{RoleManager, RoleService};
pub use user_service::{CreateUserInput, UpdateUserInput, UserManager, UserService};
