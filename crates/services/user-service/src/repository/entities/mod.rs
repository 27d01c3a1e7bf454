//! SeaORM entity definitions.
//!
//! These are database-specific entities separate from domain models.

pub mod role;
pub mod role_user;
pub mod user;
