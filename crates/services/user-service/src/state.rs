//! Application state for dependency injection.

use std::sync::Arc;

use crate::config::UserServiceConfig;
use crate::infra::Database;
use crate::repository::{RoleStore, UserStore};
use crate::service::{RoleManager, RoleService, UserManager, UserService};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserService>,
    pub role_service: Arc<dyn RoleService>,
    pub database: Database,
    pub config: Arc<UserServiceConfig>,
}

impl AppState {
    /// Wire repositories and services on top of an open database.
    pub fn new(database: Database, config: UserServiceConfig) -> Self {
        let users = Arc::new(UserStore::new(database.get_connection()));
        let roles = Arc::new(RoleStore::new(database.get_connection()));

        Self {
            user_service: Arc::new(UserManager::new(users, roles.clone())),
            role_service: Arc::new(RoleManager::new(roles)),
            database,
            config: Arc::new(config),
        }
    }
}
