use std::sync::Arc;

use huntboard_core::{ActorIdentity, AppError, AppResult};
use huntboard_domain::{
    AuditAction, Permission, PermissionId, PermissionKey, PrincipalId, well_known,
};

use crate::{
    AuditEvent, AuditRepository, AuthorizationService, PermissionRepository, RoleRepository,
};

fn principal_of(actor: &ActorIdentity) -> PrincipalId {
    PrincipalId::from_uuid(actor.principal_id())
}

/// Optional narrowing applied to permission listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionFilter {
    /// Keep only permissions in this category.
    pub category: Option<String>,
    /// Keep only permissions whose name or key contains this substring,
    /// case-insensitively.
    pub search: Option<String>,
}

impl PermissionFilter {
    fn matches(&self, permission: &Permission) -> bool {
        if let Some(category) = &self.category
            && !permission.category.eq_ignore_ascii_case(category.trim())
        {
            return false;
        }

        if let Some(search) = &self.search {
            let needle = search.trim().to_lowercase();
            if needle.is_empty() {
                return true;
            }
            return permission.name.to_lowercase().contains(&needle)
                || permission.key.as_str().contains(&needle);
        }

        true
    }
}

/// Input payload for catalog permission creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePermissionInput {
    /// Raw `category:action` key; normalized during validation.
    pub key: String,
    /// Human-readable label.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Optional explicit category; must match the key prefix when present.
    pub category: Option<String>,
}

/// Application service for the platform permission catalog.
#[derive(Clone)]
pub struct PermissionRegistryService {
    authorization_service: AuthorizationService,
    permissions: Arc<dyn PermissionRepository>,
    roles: Arc<dyn RoleRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl PermissionRegistryService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        permissions: Arc<dyn PermissionRepository>,
        roles: Arc<dyn RoleRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            permissions,
            roles,
            audit_repository,
        }
    }

    /// Lists catalog permissions, optionally filtered. No side effects.
    pub async fn list_permissions(
        &self,
        actor: &ActorIdentity,
        filter: &PermissionFilter,
    ) -> AppResult<Vec<Permission>> {
        self.authorization_service
            .require_any_permission(
                actor.tenant_id(),
                principal_of(actor),
                &[
                    well_known::MANAGE_PERMISSIONS,
                    well_known::MANAGE_ROLES,
                    well_known::VIEW_DIRECTORY,
                ],
            )
            .await?;

        let permissions = self.permissions.list_permissions().await?;
        Ok(permissions
            .into_iter()
            .filter(|permission| filter.matches(permission))
            .collect())
    }

    /// Registers a new catalog permission and emits an audit event.
    pub async fn create_permission(
        &self,
        actor: &ActorIdentity,
        input: CreatePermissionInput,
    ) -> AppResult<Permission> {
        self.authorization_service
            .require_permission(
                actor.tenant_id(),
                principal_of(actor),
                well_known::MANAGE_PERMISSIONS,
            )
            .await?;

        let key = PermissionKey::new(input.key)?;
        if self
            .permissions
            .find_permission_by_key(&key)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "permission key '{key}' is already registered"
            )));
        }

        let permission = Permission::new(
            PermissionId::new(),
            key,
            input.name,
            input.description,
            input.category,
        )?;
        self.permissions.insert_permission(permission.clone()).await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: actor.tenant_id(),
                subject: actor.principal_id().to_string(),
                action: AuditAction::PermissionCreated,
                resource_type: "catalog_permission".to_owned(),
                resource_id: permission.key.as_str().to_owned(),
                detail: Some(format!("registered permission '{}'", permission.key)),
            })
            .await?;

        Ok(permission)
    }

    /// Deletes a catalog permission.
    ///
    /// Deletion is blocked while any role references the permission, matching
    /// the role-deletion guard rather than cascading the reference away.
    pub async fn delete_permission(
        &self,
        actor: &ActorIdentity,
        permission_id: PermissionId,
    ) -> AppResult<()> {
        self.authorization_service
            .require_permission(
                actor.tenant_id(),
                principal_of(actor),
                well_known::MANAGE_PERMISSIONS,
            )
            .await?;

        let permission = self
            .permissions
            .find_permission(permission_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("permission '{permission_id}' was not found"))
            })?;

        let referencing = self
            .roles
            .count_roles_referencing_permission(permission_id)
            .await?;
        if referencing > 0 {
            return Err(AppError::Conflict(format!(
                "cannot delete permission '{}': referenced by {referencing} role(s)",
                permission.key
            )));
        }

        // The repository re-validates the reference count in its own
        // transaction; this pre-check exists for the friendlier message.
        self.permissions.delete_permission(permission_id).await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: actor.tenant_id(),
                subject: actor.principal_id().to_string(),
                action: AuditAction::PermissionDeleted,
                resource_type: "catalog_permission".to_owned(),
                resource_id: permission.key.as_str().to_owned(),
                detail: Some(format!("deleted permission '{}'", permission.key)),
            })
            .await
    }
}
