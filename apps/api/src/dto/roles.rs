use serde::{Deserialize, Serialize};
use ts_rs::TS;

use huntboard_core::{AppError, AppResult};
use huntboard_domain::{PermissionId, Role};

/// Incoming payload for role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: Option<String>,
    pub permission_ids: Vec<String>,
}

/// Incoming payload for partial role updates.
///
/// A provided `permission_ids` list fully replaces the stored grant set.
/// A missing `description` keeps the stored text; it cannot be cleared
/// through this payload.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-role-request.ts"
)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permission_ids: Option<Vec<String>>,
}

/// API representation of a custom role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub role_id: String,
    pub name: String,
    pub description: Option<String>,
    pub permission_ids: Vec<String>,
}

impl From<Role> for RoleResponse {
    fn from(value: Role) -> Self {
        Self {
            role_id: value.id.to_string(),
            name: value.name,
            description: value.description,
            permission_ids: value
                .permission_ids
                .into_iter()
                .map(|permission_id| permission_id.to_string())
                .collect(),
        }
    }
}

/// Parses transport-level permission ids into domain identifiers.
pub fn parse_permission_ids(values: &[String]) -> AppResult<Vec<PermissionId>> {
    values
        .iter()
        .map(|value| {
            uuid::Uuid::parse_str(value)
                .map(PermissionId::from_uuid)
                .map_err(|_| {
                    AppError::Validation(format!("invalid permission id '{value}'"))
                })
        })
        .collect()
}
