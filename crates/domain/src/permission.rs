use huntboard_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a permission catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionId(Uuid);

impl PermissionId {
    /// Creates a new random permission identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a permission identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PermissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PermissionId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Maximum accepted length for a permission key.
pub const PERMISSION_KEY_MAX_LENGTH: usize = 100;

/// Validated `category:action` capability key.
///
/// Keys are lowercase-normalized at construction, so case-insensitive
/// uniqueness reduces to plain equality on the stored value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionKey(String);

impl PermissionKey {
    /// Creates a validated permission key.
    ///
    /// The value must contain a non-empty category, a `:` separator, and a
    /// non-empty action. Only ASCII alphanumerics plus `_`, `-`, `.` and `:`
    /// are accepted.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let normalized = value.trim().to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(AppError::Validation(
                "permission key must not be empty".to_owned(),
            ));
        }

        if normalized.len() > PERMISSION_KEY_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "permission key must not exceed {PERMISSION_KEY_MAX_LENGTH} characters"
            )));
        }

        if let Some(invalid) = normalized
            .chars()
            .find(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.' | ':')))
        {
            return Err(AppError::Validation(format!(
                "permission key contains invalid character '{invalid}'"
            )));
        }

        let Some((category, action)) = normalized.split_once(':') else {
            return Err(AppError::Validation(format!(
                "permission key '{normalized}' must match the 'category:action' shape"
            )));
        };

        if category.is_empty() || action.is_empty() {
            return Err(AppError::Validation(format!(
                "permission key '{normalized}' must have a non-empty category and action"
            )));
        }

        Ok(Self(normalized))
    }

    /// Returns the validated key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the grouping category (the part before the first `:`).
    #[must_use]
    pub fn category(&self) -> &str {
        self.0.split(':').next().unwrap_or_default()
    }

    /// Returns the action part of the key.
    #[must_use]
    pub fn action(&self) -> &str {
        match self.0.split_once(':') {
            Some((_, action)) => action,
            None => "",
        }
    }
}

impl From<PermissionKey> for String {
    fn from(value: PermissionKey) -> Self {
        value.0
    }
}

impl std::fmt::Display for PermissionKey {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Platform-seeded keys guarding the registry's own administration.
pub mod well_known {
    /// Create and delete catalog permissions.
    pub const MANAGE_PERMISSIONS: &str = "security:manage_permissions";
    /// Create, update and delete custom roles.
    pub const MANAGE_ROLES: &str = "security:manage_roles";
    /// Assign roles and toggle member activation.
    pub const MANAGE_MEMBERS: &str = "security:manage_members";
    /// Read member and role listings.
    pub const VIEW_DIRECTORY: &str = "security:view_directory";
}

/// An atomic named capability in the platform catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Stable identifier.
    pub id: PermissionId,
    /// Globally unique capability key.
    pub key: PermissionKey,
    /// Human-readable label.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// First-class grouping category; always equals the key's prefix.
    pub category: String,
}

impl Permission {
    /// Creates a permission, deriving or validating the grouping category.
    ///
    /// When an explicit category is given it must equal the key's prefix; a
    /// mismatch would let the stored grouping drift from the stable key.
    pub fn new(
        id: PermissionId,
        key: PermissionKey,
        name: impl Into<String>,
        description: Option<String>,
        category: Option<String>,
    ) -> AppResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::Validation(
                "permission name must not be empty".to_owned(),
            ));
        }

        let derived = key.category().to_owned();
        let category = match category {
            Some(value) => {
                let value = value.trim().to_ascii_lowercase();
                if value != derived {
                    return Err(AppError::Validation(format!(
                        "category '{value}' does not match key prefix '{derived}'"
                    )));
                }
                value
            }
            None => derived,
        };

        Ok(Self {
            id,
            key,
            name,
            description,
            category,
        })
    }
}
