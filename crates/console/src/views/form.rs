//! Create / edit form state.

use domain::{Role, UserResponse};

use crate::client::{ApiClient, UserPayload};
use crate::error::{ClientError, FieldErrors};

pub const MSG_ROLES_LOAD_FAILED: &str = "Failed to load roles. Please refresh the page.";
pub const MSG_UNEXPECTED: &str = "An unexpected error occurred. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(i32),
}

/// State behind the user form.
///
/// Server-side field errors are kept per field; anything else becomes a
/// single general message. A failed role load is reported on `roles`
/// without preventing the form from opening.
#[derive(Debug, Clone)]
pub struct UserForm {
    pub mode: FormMode,
    pub full_name: String,
    pub email: String,
    /// Empty means "do not send"
    pub password: String,
    pub selected_roles: Vec<i32>,
    pub role_options: Vec<Role>,
    pub errors: FieldErrors,
    pub general_error: Option<String>,
}

impl UserForm {
    fn blank(mode: FormMode) -> Self {
        Self {
            mode,
            full_name: String::new(),
            email: String::new(),
            password: String::new(),
            selected_roles: Vec::new(),
            role_options: Vec::new(),
            errors: FieldErrors::new(),
            general_error: None,
        }
    }

    /// Empty form with role options loaded.
    pub async fn create(client: &ApiClient) -> Self {
        let mut form = Self::blank(FormMode::Create);
        form.load_roles(client).await;
        form
    }

    /// Form prefilled from an existing user. The password stays blank.
    pub async fn edit(client: &ApiClient, id: i32) -> Result<Self, ClientError> {
        let user = client.get_user(id).await?;

        let mut form = Self::blank(FormMode::Edit(id));
        form.full_name = user.full_name;
        form.email = user.email;
        form.selected_roles = user.roles.iter().map(|role| role.id).collect();
        form.load_roles(client).await;
        Ok(form)
    }

    async fn load_roles(&mut self, client: &ApiClient) {
        match client.list_roles().await {
            Ok(roles) => self.role_options = roles,
            Err(e) => {
                tracing::error!(error = %e, "Error fetching roles");
                self.set_error("roles", MSG_ROLES_LOAD_FAILED);
            }
        }
    }

    /// Select the role if unselected, otherwise deselect it
    pub fn toggle_role(&mut self, role_id: i32) {
        if let Some(pos) = self.selected_roles.iter().position(|id| *id == role_id) {
            self.selected_roles.remove(pos);
        } else {
            self.selected_roles.push(role_id);
        }
    }

    /// Select roles by name, case-insensitively. Returns names not found.
    pub fn select_roles_by_name<'a>(&mut self, names: &[&'a str]) -> Vec<&'a str> {
        let mut unknown = Vec::new();
        for name in names {
            match self
                .role_options
                .iter()
                .find(|role| role.name.eq_ignore_ascii_case(name))
            {
                Some(role) if !self.selected_roles.contains(&role.id) => {
                    self.selected_roles.push(role.id)
                }
                Some(_) => {}
                None => unknown.push(*name),
            }
        }
        unknown
    }

    pub fn payload(&self) -> UserPayload {
        let password = Some(self.password.clone()).filter(|p| !p.is_empty());

        UserPayload {
            full_name: Some(self.full_name.clone()),
            email: Some(self.email.clone()),
            password,
            roles: Some(self.selected_roles.clone()),
        }
    }

    /// Submit through the client. `Some` on success; otherwise the errors
    /// are stored on the form and `None` is returned.
    pub async fn submit(&mut self, client: &ApiClient) -> Option<UserResponse> {
        self.errors.clear();
        self.general_error = None;

        let payload = self.payload();
        let result = match self.mode {
            FormMode::Create => client.create_user(&payload).await,
            FormMode::Edit(id) => client.update_user(id, &payload).await,
        };

        match result {
            Ok(user) => Some(user),
            Err(ClientError::Validation { fields, message }) if !fields.is_empty() => {
                tracing::debug!(%message, "Form rejected");
                self.errors = fields;
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Form submission failed");
                self.general_error = Some(MSG_UNEXPECTED.to_string());
                None
            }
        }
    }

    /// First message recorded for `field`
    pub fn error_for(&self, field: &str) -> Option<&str> {
        self.errors
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.general_error.is_some()
    }

    fn set_error(&mut self, field: &str, message: &str) {
        self.errors.insert(field.to_string(), vec![message.to_string()]);
    }

    pub fn render(&self) -> String {
        let title = match self.mode {
            FormMode::Create => "Create New User".to_string(),
            FormMode::Edit(id) => format!("Edit User #{}", id),
        };

        let mut out = format!("{}\n\n", title);
        self.render_field(&mut out, "Full Name", &self.full_name, "full_name");
        self.render_field(&mut out, "Email Address", &self.email, "email");
        let masked = "*".repeat(self.password.len());
        self.render_field(&mut out, "Password", &masked, "password");

        out.push_str("Assign Roles\n");
        for role in &self.role_options {
            let mark = if self.selected_roles.contains(&role.id) { "x" } else { " " };
            out.push_str(&format!("  [{}] {}\n", mark, role.name));
        }
        if let Some(message) = self.error_for("roles") {
            out.push_str(&format!("  ! {}\n", message));
        }

        if let Some(message) = &self.general_error {
            out.push_str(&format!("\n{}\n", message));
        }
        out
    }

    fn render_field(&self, out: &mut String, label: &str, value: &str, field: &str) {
        out.push_str(&format!("{}: {}\n", label, value));
        if let Some(message) = self.error_for(field) {
            out.push_str(&format!("  ! {}\n", message));
        }
    }
}
