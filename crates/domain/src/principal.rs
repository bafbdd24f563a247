use std::str::FromStr;

use huntboard_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::RoleId;

/// Unique identifier for a principal account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrincipalId(Uuid);

impl PrincipalId {
    /// Creates a new random principal identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a principal identifier from an existing UUID value.
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

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one
    /// `@`, local part and domain are non-empty, domain contains at least one
    /// `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let parts: Vec<&str> = trimmed.splitn(2, '@').collect();
        if parts.len() != 2 {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        let local = parts[0];
        let domain = parts[1];

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Base account type of a principal, fixed at account creation.
///
/// Each type carries an externally supplied default permission set that
/// applies while no custom role is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Platform administration team member.
    AdminTeam,
    /// Employee of a company running programs.
    CompanyEmployee,
    /// Member of a researcher team.
    ResearcherTeam,
}

impl AccountType {
    /// Returns a stable storage value for this account type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AdminTeam => "admin_team",
            Self::CompanyEmployee => "company_employee",
            Self::ResearcherTeam => "researcher_team",
        }
    }

    /// Returns the label shown for the implicit default permission set.
    #[must_use]
    pub fn default_role_label(&self) -> &'static str {
        match self {
            Self::AdminTeam => "Full System Admin (Default)",
            Self::CompanyEmployee | Self::ResearcherTeam => "Standard Member (Default)",
        }
    }
}

impl FromStr for AccountType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin_team" => Ok(Self::AdminTeam),
            "company_employee" => Ok(Self::CompanyEmployee),
            "researcher_team" => Ok(Self::ResearcherTeam),
            _ => Err(AppError::Validation(format!(
                "unknown account type '{value}'"
            ))),
        }
    }
}

/// Effective role-binding state of a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleBinding {
    /// A custom role is bound; its grants are the effective set.
    Bound(RoleId),
    /// No custom role; the account type's default set applies.
    Default(AccountType),
}

/// A user account capable of being bound to a custom role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable identifier.
    pub id: PrincipalId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Validated login email.
    pub email: EmailAddress,
    /// Whether the account may act at all; deactivated accounts fail every
    /// authorization check.
    pub is_active: bool,
    /// Base account type, decides the default permission set when unbound.
    pub account_type: AccountType,
    /// Optional custom role reference; `None` means the default set applies.
    pub custom_role_id: Option<RoleId>,
}

impl Principal {
    /// Returns the display name used in audit details and actor context.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Returns the current binding state.
    #[must_use]
    pub fn binding(&self) -> RoleBinding {
        match self.custom_role_id {
            Some(role_id) => RoleBinding::Bound(role_id),
            None => RoleBinding::Default(self.account_type),
        }
    }
}
