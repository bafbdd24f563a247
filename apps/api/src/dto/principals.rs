use serde::{Deserialize, Serialize};
use ts_rs::TS;

use huntboard_application::BulkOutcome;
use huntboard_core::{AppError, AppResult};
use huntboard_domain::{Principal, PrincipalId, RoleBinding, RoleId};

/// Incoming payload for a single role assignment.
///
/// A missing `role_id` reverts the principal to its account-type defaults.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/assign-role-request.ts"
)]
pub struct AssignRoleRequest {
    pub role_id: Option<String>,
}

/// Incoming payload for bulk role assignment.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/bulk-assign-role-request.ts"
)]
pub struct BulkAssignRoleRequest {
    pub principal_ids: Vec<String>,
    pub role_id: Option<String>,
}

/// Incoming payload for bulk activation toggles.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/bulk-toggle-status-request.ts"
)]
pub struct BulkToggleStatusRequest {
    pub principal_ids: Vec<String>,
    pub is_active: bool,
}

/// API representation of a directory member.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/principal-response.ts"
)]
pub struct PrincipalResponse {
    pub principal_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_active: bool,
    pub account_type: String,
    pub custom_role_id: Option<String>,
    /// Role name for bound principals, the account-type default label
    /// otherwise.
    pub role_label: String,
}

impl PrincipalResponse {
    /// Creates a response, resolving the role label from the bound role name
    /// when one is provided.
    #[must_use]
    pub fn from_principal(value: Principal, bound_role_name: Option<String>) -> Self {
        let role_label = match value.binding() {
            RoleBinding::Bound(_) => {
                bound_role_name.unwrap_or_else(|| "Custom Role".to_owned())
            }
            RoleBinding::Default(account_type) => account_type.default_role_label().to_owned(),
        };

        Self {
            principal_id: value.id.to_string(),
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email.as_str().to_owned(),
            is_active: value.is_active,
            account_type: value.account_type.as_str().to_owned(),
            custom_role_id: value.custom_role_id.map(|role_id| role_id.to_string()),
            role_label,
        }
    }
}

/// One failed entry of a bulk operation.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/bulk-failure-response.ts"
)]
pub struct BulkFailureResponse {
    pub principal_id: String,
    pub reason: String,
}

/// Continue-on-error summary of a bulk operation.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/bulk-outcome-response.ts"
)]
pub struct BulkOutcomeResponse {
    pub updated_count: u32,
    pub failures: Vec<BulkFailureResponse>,
}

impl From<BulkOutcome> for BulkOutcomeResponse {
    fn from(value: BulkOutcome) -> Self {
        Self {
            updated_count: u32::try_from(value.updated_count).unwrap_or(u32::MAX),
            failures: value
                .failures
                .into_iter()
                .map(|failure| BulkFailureResponse {
                    principal_id: failure.principal_id.to_string(),
                    reason: failure.reason,
                })
                .collect(),
        }
    }
}

/// Parses a transport-level principal id.
pub fn parse_principal_id(value: &str) -> AppResult<PrincipalId> {
    uuid::Uuid::parse_str(value)
        .map(PrincipalId::from_uuid)
        .map_err(|_| AppError::Validation(format!("invalid principal id '{value}'")))
}

/// Parses an optional transport-level role id.
pub fn parse_role_id(value: Option<&str>) -> AppResult<Option<RoleId>> {
    value
        .map(|value| {
            uuid::Uuid::parse_str(value)
                .map(RoleId::from_uuid)
                .map_err(|_| AppError::Validation(format!("invalid role id '{value}'")))
        })
        .transpose()
}
