//! Role service - listing and seeding roles.

use std::sync::Arc;

use async_trait::async_trait;

use common::AppResult;
use domain::{Role, DEFAULT_ROLES};

use crate::repository::RoleRepository;

#[async_trait]
pub trait RoleService: Send + Sync {
    /// All roles, ordered by id
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Ensure every default role exists. Safe to run repeatedly.
    async fn seed_defaults(&self) -> AppResult<Vec<Role>>;
}

pub struct RoleManager {
    roles: Arc<dyn RoleRepository>,
}

impl RoleManager {
    pub fn new(roles: Arc<dyn RoleRepository>) -> Self {
        Self { roles }
    }
}

#[async_trait]
impl RoleService for RoleManager {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.roles.list().await
    }

    async fn seed_defaults(&self) -> AppResult<Vec<Role>> {
        let mut seeded = Vec::with_capacity(DEFAULT_ROLES.len());
        for (name, description) in DEFAULT_ROLES {
            seeded.push(self.roles.first_or_create(name, description).await?);
        }

        tracing::info!(count = seeded.len(), "Default roles seeded");
        Ok(seeded)
    }
}
