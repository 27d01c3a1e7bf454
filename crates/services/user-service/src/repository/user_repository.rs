//! User repository with role association management.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};

use common::{AppError, AppResult, OptionExt};
use domain::{
    NewUser, Role, User, UserChanges, FIELD_EMAIL, FIELD_ROLES, MSG_EMAIL_TAKEN, MSG_ROLES_INVALID,
};

use super::entities::{role, role_user, user};
use super::transaction::in_transaction;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

const ENTITY: &str = "User";

/// User repository trait for dependency injection.
///
/// Every returned [`User`] has its roles loaded. Writes that touch more
/// than one table run in a single transaction.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// List every user, ordered by id
    async fn list_all(&self) -> AppResult<Vec<User>>;

    /// Find user by ID; `NotFound` when absent
    async fn find_by_id(&self, id: i32) -> AppResult<User>;

    /// Find user by email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert the user and attach its roles
    async fn create(&self, data: NewUser) -> AppResult<User>;

    /// Apply the changes; `roles: Some(..)` replaces every association
    async fn update(&self, id: i32, changes: UserChanges) -> AppResult<User>;

    /// Detach all roles and delete the row. Returns whether a row was removed.
    async fn delete(&self, id: i32) -> AppResult<bool>;

    /// Attach roles, skipping ones the user already holds
    async fn attach_roles(&self, user_id: i32, role_ids: Vec<i32>) -> AppResult<()>;

    /// Detach roles. Returns the number of associations removed.
    async fn detach_roles(&self, user_id: i32, role_ids: Vec<i32>) -> AppResult<u64>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn list_all(&self) -> AppResult<Vec<User>> {
        let models = user::Entity::find()
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await?;

        with_roles(&self.db, models).await
    }

    async fn find_by_id(&self, id: i32) -> AppResult<User> {
        let model = user::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_not_found(ENTITY)?;

        load_one(&self.db, model).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        match model {
            Some(model) => Ok(Some(load_one(&self.db, model).await?)),
            None => Ok(None),
        }
    }

    async fn create(&self, data: NewUser) -> AppResult<User> {
        in_transaction(&self.db, move |txn| {
            Box::pin(async move {
                let now = Utc::now();
                let model = user::ActiveModel {
                    full_name: Set(data.full_name),
                    email: Set(data.email),
                    password: Set(data.password_hash),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await
                .map_err(user_write_error)?;

                insert_links(txn, model.id, &data.roles).await?;
                load_one(txn, model).await
            })
        })
        .await
    }

    async fn update(&self, id: i32, changes: UserChanges) -> AppResult<User> {
        let existing = user::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_not_found(ENTITY)?;

        in_transaction(&self.db, move |txn| {
            Box::pin(async move {
                let mut active: user::ActiveModel = existing.into();
                if let Some(full_name) = changes.full_name {
                    active.full_name = Set(full_name);
                }
                if let Some(email) = changes.email {
                    active.email = Set(email);
                }
                if let Some(password_hash) = changes.password_hash {
                    active.password = Set(password_hash);
                }
                active.updated_at = Set(Utc::now());

                let model = active.update(txn).await.map_err(user_write_error)?;

                if let Some(role_ids) = changes.roles {
                    role_user::Entity::delete_many()
                        .filter(role_user::Column::UserId.eq(id))
                        .exec(txn)
                        .await?;
                    insert_links(txn, id, &role_ids).await?;
                }

                load_one(txn, model).await
            })
        })
        .await
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        ensure_exists(&self.db, id).await?;

        in_transaction(&self.db, move |txn| {
            Box::pin(async move {
                role_user::Entity::delete_many()
                    .filter(role_user::Column::UserId.eq(id))
                    .exec(txn)
                    .await?;

                let result = user::Entity::delete_by_id(id).exec(txn).await?;
                Ok(result.rows_affected > 0)
            })
        })
        .await
    }

    async fn attach_roles(&self, user_id: i32, role_ids: Vec<i32>) -> AppResult<()> {
        ensure_exists(&self.db, user_id).await?;

        in_transaction(&self.db, move |txn| {
            Box::pin(async move { insert_links(txn, user_id, &role_ids).await })
        })
        .await
    }

    async fn detach_roles(&self, user_id: i32, role_ids: Vec<i32>) -> AppResult<u64> {
        ensure_exists(&self.db, user_id).await?;

        let result = role_user::Entity::delete_many()
            .filter(role_user::Column::UserId.eq(user_id))
            .filter(role_user::Column::RoleId.is_in(role_ids))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

async fn ensure_exists<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<()> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_not_found(ENTITY)
}

/// Insert `(role_id, user_id)` pairs that are not present yet.
async fn insert_links<C: ConnectionTrait>(db: &C, user_id: i32, role_ids: &[i32]) -> AppResult<()> {
    let wanted: BTreeSet<i32> = role_ids.iter().copied().collect();
    if wanted.is_empty() {
        return Ok(());
    }

    let present: BTreeSet<i32> = role_user::Entity::find()
        .filter(role_user::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.role_id)
        .collect();

    let links: Vec<role_user::ActiveModel> = wanted
        .difference(&present)
        .map(|role_id| role_user::ActiveModel {
            role_id: Set(*role_id),
            user_id: Set(user_id),
        })
        .collect();

    if links.is_empty() {
        return Ok(());
    }

    role_user::Entity::insert_many(links)
        .exec_without_returning(db)
        .await
        .map_err(link_write_error)?;

    Ok(())
}

async fn load_one<C: ConnectionTrait>(db: &C, model: user::Model) -> AppResult<User> {
    with_roles(db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| AppError::internal("user vanished while loading roles"))
}

/// Attach role entities to each user model, preserving the input order.
async fn with_roles<C: ConnectionTrait>(db: &C, models: Vec<user::Model>) -> AppResult<Vec<User>> {
    let user_ids: Vec<i32> = models.iter().map(|m| m.id).collect();

    let links = role_user::Entity::find()
        .filter(role_user::Column::UserId.is_in(user_ids))
        .all(db)
        .await?;

    let role_ids: BTreeSet<i32> = links.iter().map(|link| link.role_id).collect();
    let roles: HashMap<i32, Role> = role::Entity::find()
        .filter(role::Column::Id.is_in(role_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|model| (model.id, Role::from(model)))
        .collect();

    let mut by_user: HashMap<i32, Vec<Role>> = HashMap::new();
    for link in links {
        if let Some(role) = roles.get(&link.role_id) {
            by_user.entry(link.user_id).or_default().push(role.clone());
        }
    }

    Ok(models
        .into_iter()
        .map(|model| {
            let mut roles = by_user.remove(&model.id).unwrap_or_default();
            roles.sort_by_key(|role| role.id);
            User {
                id: model.id,
                full_name: model.full_name,
                email: model.email,
                password_hash: model.password,
                roles,
                created_at: model.created_at,
                updated_at: model.updated_at,
            }
        })
        .collect())
}

/// Map a unique violation on the `users` row to the email field.
fn user_write_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::field(FIELD_EMAIL, MSG_EMAIL_TAKEN),
        _ => AppError::Database(err),
    }
}

/// Map a foreign key violation on `role_user` to the roles field.
fn link_write_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            AppError::field(FIELD_ROLES, MSG_ROLES_INVALID)
        }
        _ => AppError::Database(err),
    }
}
