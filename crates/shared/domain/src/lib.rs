//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! Types here are shared by the user service and the console client.

pub mod constants;
pub mod error;
pub mod password;
pub mod role;
pub mod user;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use password::Password;
pub use role::{group_by_role, Role, UsersByRole};
pub use user::{NewUser, User, UserChanges, UserResponse, UserSummary};
