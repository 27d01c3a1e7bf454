//! User service - Handles user-related business logic.
//!
//! Field checks that need the database (email availability, role existence)
//! are collected together so one response reports every problem.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use common::{AppError, AppResult, FieldErrors};
use domain::{
    group_by_role, NewUser, Password, User, UserChanges, UsersByRole, FIELD_EMAIL, FIELD_ROLES,
    MSG_EMAIL_TAKEN, MSG_ROLES_INVALID, MSG_ROLES_REQUIRED,
};

use crate::repository::{RoleRepository, UserRepository};

/// Input for creating a user. Shape checks happen in the handler.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub full_name: String,
    pub email: String,
    /// Plain text; a random credential is stored when absent
    pub password: Option<String>,
    pub roles: Vec<i32>,
}

/// Partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub roles: Option<Vec<i32>>,
}

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// Users grouped under each role name they hold
    async fn list_users_by_role(&self) -> AppResult<UsersByRole>;

    async fn get_user(&self, id: i32) -> AppResult<User>;

    async fn create_user(&self, input: CreateUserInput) -> AppResult<User>;

    async fn update_user(&self, id: i32, input: UpdateUserInput) -> AppResult<User>;

    async fn delete_user(&self, id: i32) -> AppResult<()>;

    /// Attach roles and return the user with its new role set
    async fn attach_roles(&self, id: i32, role_ids: Vec<i32>) -> AppResult<User>;

    /// Detach roles and return the user with its remaining roles
    async fn detach_roles(&self, id: i32, role_ids: Vec<i32>) -> AppResult<User>;
}

/// Concrete implementation of UserService using repositories.
pub struct UserManager {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
}

impl UserManager {
    pub fn new(users: Arc<dyn UserRepository>, roles: Arc<dyn RoleRepository>) -> Self {
        Self { users, roles }
    }

    /// Record an error when `email` belongs to someone other than `current_id`.
    async fn check_email(
        &self,
        email: &str,
        current_id: Option<i32>,
        errors: &mut FieldErrors,
    ) -> AppResult<()> {
        if let Some(owner) = self.users.find_by_email(email).await? {
            if Some(owner.id) != current_id {
                push(errors, FIELD_EMAIL, MSG_EMAIL_TAKEN);
            }
        }
        Ok(())
    }

    async fn check_roles(&self, role_ids: &[i32], errors: &mut FieldErrors) -> AppResult<()> {
        if role_ids.is_empty() {
            push(errors, FIELD_ROLES, MSG_ROLES_REQUIRED);
            return Ok(());
        }

        let missing = self.roles.missing_ids(role_ids).await?;
        if !missing.is_empty() {
            tracing::debug!(?missing, "Unknown role ids submitted");
            push(errors, FIELD_ROLES, MSG_ROLES_INVALID);
        }
        Ok(())
    }
}

fn push(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

fn reject(errors: FieldErrors) -> AppResult<()> {
    match AppError::from_fields(errors) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.users.list_all().await
    }

    async fn list_users_by_role(&self) -> AppResult<UsersByRole> {
        let users = self.users.list_all().await?;
        Ok(group_by_role(&users))
    }

    async fn get_user(&self, id: i32) -> AppResult<User> {
        self.users.find_by_id(id).await
    }

    async fn create_user(&self, input: CreateUserInput) -> AppResult<User> {
        let mut errors = FieldErrors::new();
        self.check_email(&input.email, None, &mut errors).await?;
        self.check_roles(&input.roles, &mut errors).await?;
        reject(errors)?;

        let password = match input.password {
            Some(plain) => Password::new(&plain)?,
            None => Password::new(&Uuid::new_v4().simple().to_string())?,
        };

        let user = self
            .users
            .create(NewUser {
                full_name: input.full_name,
                email: input.email,
                password_hash: password.into_string(),
                roles: input.roles,
            })
            .await?;

        tracing::info!(user_id = user.id, roles = ?user.role_ids(), "User created");
        Ok(user)
    }

    async fn update_user(&self, id: i32, input: UpdateUserInput) -> AppResult<User> {
        self.users.find_by_id(id).await?;

        let mut errors = FieldErrors::new();
        if let Some(email) = &input.email {
            self.check_email(email, Some(id), &mut errors).await?;
        }
        if let Some(role_ids) = &input.roles {
            self.check_roles(role_ids, &mut errors).await?;
        }
        reject(errors)?;

        let password_hash = match input.password {
            Some(plain) => Some(Password::new(&plain)?.into_string()),
            None => None,
        };

        let user = self
            .users
            .update(
                id,
                UserChanges {
                    full_name: input.full_name,
                    email: input.email,
                    password_hash,
                    roles: input.roles,
                },
            )
            .await?;

        tracing::info!(user_id = user.id, roles = ?user.role_ids(), "User updated");
        Ok(user)
    }

    async fn delete_user(&self, id: i32) -> AppResult<()> {
        if !self.users.delete(id).await? {
            return Err(AppError::not_found("User"));
        }

        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }

    async fn attach_roles(&self, id: i32, role_ids: Vec<i32>) -> AppResult<User> {
        self.users.find_by_id(id).await?;

        let mut errors = FieldErrors::new();
        self.check_roles(&role_ids, &mut errors).await?;
        reject(errors)?;

        self.users.attach_roles(id, role_ids).await?;
        self.users.find_by_id(id).await
    }

    async fn detach_roles(&self, id: i32, role_ids: Vec<i32>) -> AppResult<User> {
        if role_ids.is_empty() {
            return Err(AppError::field(FIELD_ROLES, MSG_ROLES_REQUIRED));
        }

        let removed = self.users.detach_roles(id, role_ids).await?;
        tracing::info!(user_id = id, removed, "Roles detached");
        self.users.find_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::predicate::eq;

    use super::*;
    use crate::repository::{MockRoleRepository, MockUserRepository};
    use domain::Role;

    fn role(id: i32, name: &str) -> Role {
        Role {
            id,
            name: name.to_string(),
            description: None,
        }
    }

    fn user(id: i32, email: &str, roles: Vec<Role>) -> User {
        User {
            id,
            full_name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: "hashed".to_string(),
            roles,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn manager(users: MockUserRepository, roles: MockRoleRepository) -> UserManager {
        UserManager::new(Arc::new(users), Arc::new(roles))
    }

    fn create_input(roles: Vec<i32>) -> CreateUserInput {
        CreateUserInput {
            full_name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            password: Some("password123".to_string()),
            roles,
        }
    }

    #[tokio::test]
    async fn test_create_user_hashes_password() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users
            .expect_create()
            .withf(|data| data.password_hash.starts_with("$argon2") && data.roles == vec![2])
            .returning(|data| Ok(user(1, &data.email, vec![role(2, "Editor")])));

        let mut roles = MockRoleRepository::new();
        roles.expect_missing_ids().returning(|_| Ok(vec![]));

        let created = manager(users, roles)
            .create_user(create_input(vec![2]))
            .await
            .unwrap();

        assert_eq!(created.id, 1);
        assert!(created.has_role("Editor"));
    }

    #[tokio::test]
    async fn test_create_user_without_password_stores_random_hash() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users
            .expect_create()
            .withf(|data| data.password_hash.starts_with("$argon2"))
            .returning(|data| Ok(user(1, &data.email, vec![])));

        let mut roles = MockRoleRepository::new();
        roles.expect_missing_ids().returning(|_| Ok(vec![]));

        let mut input = create_input(vec![1]);
        input.password = None;

        assert!(manager(users, roles).create_user(input).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_user_reports_every_field_error() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|email| Ok(Some(user(9, email, vec![]))));
        users.expect_create().never();

        let mut roles = MockRoleRepository::new();
        roles.expect_missing_ids().returning(|_| Ok(vec![99]));

        let err = manager(users, roles)
            .create_user(create_input(vec![99]))
            .await
            .unwrap_err();

        let fields = err.field_errors().unwrap();
        assert_eq!(fields["email"], vec![MSG_EMAIL_TAKEN.to_string()]);
        assert_eq!(fields["roles"], vec![MSG_ROLES_INVALID.to_string()]);
    }

    #[tokio::test]
    async fn test_create_user_requires_roles() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users.expect_create().never();

        let mut roles = MockRoleRepository::new();
        roles.expect_missing_ids().never();

        let err = manager(users, roles)
            .create_user(create_input(vec![]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), MSG_ROLES_REQUIRED);
    }

    #[tokio::test]
    async fn test_update_user_keeps_own_email_and_password() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .with(eq(5))
            .returning(|id| Ok(user(id, "jane@example.com", vec![])));
        users
            .expect_find_by_email()
            .returning(|email| Ok(Some(user(5, email, vec![]))));
        users
            .expect_update()
            .withf(|id, changes| *id == 5 && changes.password_hash.is_none() && changes.roles.is_none())
            .returning(|id, _| Ok(user(id, "jane@example.com", vec![])));

        let input = UpdateUserInput {
            email: Some("jane@example.com".to_string()),
            ..Default::default()
        };

        let updated = manager(users, MockRoleRepository::new())
            .update_user(5, input)
            .await
            .unwrap();
        assert_eq!(updated.id, 5);
    }

    #[tokio::test]
    async fn test_update_user_rejects_email_of_another_user() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(|id| Ok(user(id, "jane@example.com", vec![])));
        users
            .expect_find_by_email()
            .returning(|email| Ok(Some(user(6, email, vec![]))));
        users.expect_update().never();

        let input = UpdateUserInput {
            email: Some("bob@example.com".to_string()),
            ..Default::default()
        };

        let err = manager(users, MockRoleRepository::new())
            .update_user(5, input)
            .await
            .unwrap_err();
        assert!(err.field_errors().unwrap().contains_key("email"));
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(|_| Err(AppError::not_found("User")));
        users.expect_update().never();

        let err = manager(users, MockRoleRepository::new())
            .update_user(42, UpdateUserInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_user_with_empty_roles_is_rejected() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(|id| Ok(user(id, "jane@example.com", vec![])));
        users.expect_update().never();

        let input = UpdateUserInput {
            roles: Some(vec![]),
            ..Default::default()
        };

        let err = manager(users, MockRoleRepository::new())
            .update_user(5, input)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), MSG_ROLES_REQUIRED);
    }

    #[tokio::test]
    async fn test_delete_user_not_removed_is_not_found() {
        let mut users = MockUserRepository::new();
        users.expect_delete().with(eq(3)).returning(|_| Ok(false));

        let err = manager(users, MockRoleRepository::new())
            .delete_user(3)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_attach_roles_validates_existence() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(|id| Ok(user(id, "jane@example.com", vec![])));
        users.expect_attach_roles().never();

        let mut roles = MockRoleRepository::new();
        roles
            .expect_missing_ids()
            .returning(|ids| Ok(ids.to_vec()));

        let err = manager(users, roles)
            .attach_roles(1, vec![7])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), MSG_ROLES_INVALID);
    }

    #[tokio::test]
    async fn test_list_users_by_role_groups() {
        let mut users = MockUserRepository::new();
        users.expect_list_all().returning(|| {
            Ok(vec![
                user(1, "a@example.com", vec![role(1, "Administrator")]),
                user(2, "b@example.com", vec![role(1, "Administrator"), role(2, "Editor")]),
            ])
        });

        let grouped = manager(users, MockRoleRepository::new())
            .list_users_by_role()
            .await
            .unwrap();

        assert_eq!(grouped["Administrator"].len(), 2);
        assert_eq!(grouped["Editor"][0].id, 2);
    }
}
