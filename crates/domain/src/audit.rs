use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by registry use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a catalog permission is created.
    PermissionCreated,
    /// Emitted when a catalog permission is deleted.
    PermissionDeleted,
    /// Emitted when a custom role is created.
    RoleCreated,
    /// Emitted when a custom role is updated.
    RoleUpdated,
    /// Emitted when a custom role is deleted.
    RoleDeleted,
    /// Emitted when a role is bound to a principal.
    RoleAssigned,
    /// Emitted when a principal reverts to its default permission set.
    RoleUnassigned,
    /// Emitted when a bulk role assignment completes.
    BulkRoleAssigned,
    /// Emitted when a bulk activation toggle completes.
    BulkStatusToggled,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionCreated => "security.permission.created",
            Self::PermissionDeleted => "security.permission.deleted",
            Self::RoleCreated => "security.role.created",
            Self::RoleUpdated => "security.role.updated",
            Self::RoleDeleted => "security.role.deleted",
            Self::RoleAssigned => "security.role.assigned",
            Self::RoleUnassigned => "security.role.unassigned",
            Self::BulkRoleAssigned => "security.role.bulk_assigned",
            Self::BulkStatusToggled => "security.member.bulk_status_toggled",
        }
    }
}
