//! Repository layer for data access.

pub mod entities;
mod role_repository;
mod transaction;
mod user_repository;

pub use role_repository::{RoleRepository, RoleStore};
pub use transaction::{in_transaction, TxFuture};
pub use user_repository::{UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use role_repository::MockRoleRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
