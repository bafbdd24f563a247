use serde::{Deserialize, Serialize};
use ts_rs::TS;

use huntboard_application::PermissionFilter;
use huntboard_domain::Permission;

/// Query parameters accepted by the permission listing.
#[derive(Debug, Default, Deserialize)]
pub struct PermissionListQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl From<PermissionListQuery> for PermissionFilter {
    fn from(value: PermissionListQuery) -> Self {
        Self {
            category: value.category,
            search: value.search,
        }
    }
}

/// Incoming payload for permission creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-permission-request.ts"
)]
pub struct CreatePermissionRequest {
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

/// API representation of a catalog permission.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-response.ts"
)]
pub struct PermissionResponse {
    pub permission_id: String,
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
}

impl From<Permission> for PermissionResponse {
    fn from(value: Permission) -> Self {
        Self {
            permission_id: value.id.to_string(),
            key: value.key.to_string(),
            name: value.name,
            description: value.description,
            category: value.category,
        }
    }
}
