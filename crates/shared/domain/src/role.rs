//! Role entity and role-centric views of users.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::user::{User, UserSummary};

/// Role domain entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Role {
    #[cfg_attr(feature = "openapi", schema(example = 1))]
    pub id: i32,
    #[cfg_attr(feature = "openapi", schema(example = "Administrator"))]
    pub name: String,
    #[cfg_attr(feature = "openapi", schema(example = "Full system access"))]
    pub description: Option<String>,
}

/// Role name mapped to the users holding it.
pub type UsersByRole = BTreeMap<String, Vec<UserSummary>>;

/// Group users under each role they hold.
///
/// A user with several roles appears under each of them; users without
/// roles do not appear at all. Members keep the order of `users`.
pub fn group_by_role(users: &[User]) -> UsersByRole {
    let mut grouped = UsersByRole::new();
    for user in users {
        for role in &user.roles {
            grouped
                .entry(role.name.clone())
                .or_default()
                .push(UserSummary::from(user));
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn role(id: i32, name: &str) -> Role {
        Role {
            id,
            name: name.to_string(),
            description: None,
        }
    }

    fn user(id: i32, name: &str, roles: Vec<Role>) -> User {
        User {
            id,
            full_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            password_hash: "hashed".to_string(),
            roles,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_listed_under_every_role() {
        let users = vec![
            user(1, "Ada", vec![role(1, "Administrator"), role(2, "Editor")]),
            user(2, "Bob", vec![role(2, "Editor")]),
        ];

        let grouped = group_by_role(&users);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["Administrator"].len(), 1);
        let editors: Vec<i32> = grouped["Editor"].iter().map(|u| u.id).collect();
        assert_eq!(editors, vec![1, 2]);
    }

    #[test]
    fn test_users_without_roles_are_omitted() {
        let users = vec![user(1, "Ada", vec![])];
        assert!(group_by_role(&users).is_empty());
    }

    #[test]
    fn test_summary_has_no_password() {
        let users = vec![user(1, "Ada", vec![role(1, "Author")])];
        let json = serde_json::to_value(group_by_role(&users)).unwrap();

        let member = &json["Author"][0];
        assert_eq!(member["full_name"], "Ada");
        assert!(member.get("password_hash").is_none());
    }
}
