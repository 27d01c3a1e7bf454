//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Default Roles
// =============================================================================

/// Roles created by the seeder, as `(name, description)` pairs.
pub const DEFAULT_ROLES: &[(&str, &str)] = &[
    ("Administrator", "Full system access"),
    ("Editor", "Can edit and manage content"),
    ("Author", "Can create and manage own content"),
    ("Subscriber", "Can view and interact with content"),
];

// =============================================================================
// Validation
// =============================================================================

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 8;

// =============================================================================
// Field Names
// =============================================================================

pub const FIELD_EMAIL: &str = "email";
pub const FIELD_PASSWORD: &str = "password";
pub const FIELD_ROLES: &str = "roles";

// =============================================================================
// Messages
// =============================================================================

/// Email already taken by another user
pub const MSG_EMAIL_TAKEN: &str = "This email address is already in use.";

/// Roles list missing or empty
pub const MSG_ROLES_REQUIRED: &str = "Please select at least one role.";

/// One of the submitted role ids does not exist
pub const MSG_ROLES_INVALID: &str = "One or more selected roles are invalid.";

/// Summary message attached to every validation failure
pub const MSG_VALIDATION_FAILED: &str = "The given data was invalid.";
