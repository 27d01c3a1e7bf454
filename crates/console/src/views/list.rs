//! Read-only user listing.

use domain::{Role, UserResponse, UsersByRole};

use crate::client::ApiClient;
use crate::error::ClientResult;

/// Users as returned by either list endpoint
#[derive(Debug, Clone)]
pub enum Listing {
    Flat(Vec<UserResponse>),
    ByRole(UsersByRole),
}

/// Users and the role catalogue, ready to render.
#[derive(Debug, Clone)]
pub struct ListView {
    pub roles: Vec<Role>,
    pub listing: Listing,
}

impl ListView {
    pub async fn load(client: &ApiClient, by_role: bool) -> ClientResult<Self> {
        let roles = client.list_roles().await?;
        let listing = if by_role {
            Listing::ByRole(client.list_users_by_role().await?)
        } else {
            Listing::Flat(client.list_users().await?)
        };

        Ok(Self { roles, listing })
    }

    pub fn render(&self) -> String {
        match &self.listing {
            Listing::Flat(users) => render_flat(users),
            Listing::ByRole(grouped) => self.render_grouped(grouped),
        }
    }

    /// One section per known role, in catalogue order. Groups for role
    /// names missing from the catalogue follow at the end.
    fn render_grouped(&self, grouped: &UsersByRole) -> String {
        let mut out = String::from("Users by Role\n");

        let mut names: Vec<&str> = self.roles.iter().map(|role| role.name.as_str()).collect();
        for name in grouped.keys() {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }

        for name in names {
            let members = grouped.get(name).map(Vec::as_slice).unwrap_or_default();
            let unit = if members.len() == 1 { "user" } else { "users" };
            out.push_str(&format!("\n{} ({} {})\n", name, members.len(), unit));

            if members.is_empty() {
                out.push_str("  No users with this role\n");
            }
            for member in members {
                out.push_str(&format!(
                    "  #{:<4} {:<24} {}\n",
                    member.id, member.full_name, member.email
                ));
            }
        }

        out
    }
}

fn render_flat(users: &[UserResponse]) -> String {
    if users.is_empty() {
        return "No users found.\n".to_string();
    }

    let mut out = format!("{:<5} {:<24} {:<32} {}\n", "ID", "Full name", "Email", "Roles");
    for user in users {
        let roles: Vec<&str> = user.roles.iter().map(|role| role.name.as_str()).collect();
        out.push_str(&format!(
            "{:<5} {:<24} {:<32} {}\n",
            user.id,
            user.full_name,
            user.email,
            roles.join(", ")
        ));
    }
    out
}
