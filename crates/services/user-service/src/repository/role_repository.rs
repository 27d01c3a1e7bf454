//! Role repository.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use common::AppResult;
use domain::Role;

use super::entities::role;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// All roles, ordered by id
    async fn list(&self) -> AppResult<Vec<Role>>;

    /// Ids from `ids` that have no matching role, sorted and deduplicated
    async fn missing_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>>;

    /// Return the role named `name`, inserting it when absent
    async fn first_or_create(&self, name: &str, description: &str) -> AppResult<Role>;
}

pub struct RoleStore {
    db: DatabaseConnection,
}

impl RoleStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoleRepository for RoleStore {
    async fn list(&self) -> AppResult<Vec<Role>> {
        let models = role::Entity::find()
            .order_by_asc(role::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Role::from).collect())
    }

    async fn missing_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>> {
        let wanted: BTreeSet<i32> = ids.iter().copied().collect();
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let found: BTreeSet<i32> = role::Entity::find()
            .filter(role::Column::Id.is_in(wanted.iter().copied()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|model| model.id)
            .collect();

        Ok(wanted.difference(&found).copied().collect())
    }

    async fn first_or_create(&self, name: &str, description: &str) -> AppResult<Role> {
        let existing = role::Entity::find()
            .filter(role::Column::Name.eq(name))
            .one(&self.db)
            .await?;

        if let Some(model) = existing {
            return Ok(model.into());
        }

        let model = role::ActiveModel {
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        tracing::info!(role_id = model.id, name = %model.name, "Role created");
        Ok(model.into())
    }
}
