use std::collections::BTreeSet;
use std::sync::Arc;

use huntboard_core::{ActorIdentity, AppError, AppResult};
use huntboard_domain::{
    AuditAction, PermissionId, PrincipalId, Role, RoleId, well_known,
};

use crate::{
    AuditEvent, AuditRepository, AuthorizationService, PermissionRepository, PrincipalRepository,
    RoleRepository,
};

fn principal_of(actor: &ActorIdentity) -> PrincipalId {
    PrincipalId::from_uuid(actor.principal_id())
}

/// Input payload for custom role creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Role name, unique within the tenant.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Permissions to grant; must not be empty.
    pub permission_ids: Vec<PermissionId>,
}

/// Partial update payload for an existing role.
///
/// A provided permission set fully replaces the prior one; it is never
/// merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRoleInput {
    /// New role name, when changing it.
    pub name: Option<String>,
    /// New description, when changing it. `None` keeps the stored text;
    /// this payload cannot clear it.
    pub description: Option<String>,
    /// Replacement grant set, when changing it.
    pub permission_ids: Option<Vec<PermissionId>>,
}

/// Application service composing and maintaining custom roles.
#[derive(Clone)]
pub struct RoleService {
    authorization_service: AuthorizationService,
    roles: Arc<dyn RoleRepository>,
    permissions: Arc<dyn PermissionRepository>,
    principals: Arc<dyn PrincipalRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl RoleService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        roles: Arc<dyn RoleRepository>,
        permissions: Arc<dyn PermissionRepository>,
        principals: Arc<dyn PrincipalRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            roles,
            permissions,
            principals,
            audit_repository,
        }
    }

    /// Returns tenant roles for administrative users.
    pub async fn list_roles(&self, actor: &ActorIdentity) -> AppResult<Vec<Role>> {
        self.authorization_service
            .require_any_permission(
                actor.tenant_id(),
                principal_of(actor),
                &[well_known::MANAGE_ROLES, well_known::VIEW_DIRECTORY],
            )
            .await?;

        self.roles.list_roles(actor.tenant_id()).await
    }

    /// Creates a custom role and emits an audit event.
    pub async fn create_role(
        &self,
        actor: &ActorIdentity,
        input: CreateRoleInput,
    ) -> AppResult<Role> {
        self.authorization_service
            .require_permission(actor.tenant_id(), principal_of(actor), well_known::MANAGE_ROLES)
            .await?;

        let permission_ids = self.validated_grant_set(&input.permission_ids).await?;
        let role = Role::new(RoleId::new(), input.name, input.description, permission_ids)?;
        self.roles.insert_role(actor.tenant_id(), role.clone()).await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: actor.tenant_id(),
                subject: actor.principal_id().to_string(),
                action: AuditAction::RoleCreated,
                resource_type: "rbac_role".to_owned(),
                resource_id: role.id.to_string(),
                detail: Some(format!(
                    "created role '{}' with {} grant(s)",
                    role.name,
                    role.permission_ids.len()
                )),
            })
            .await?;

        Ok(role)
    }

    /// Applies a partial update to a role and emits an audit event.
    pub async fn update_role(
        &self,
        actor: &ActorIdentity,
        role_id: RoleId,
        input: UpdateRoleInput,
    ) -> AppResult<Role> {
        self.authorization_service
            .require_permission(actor.tenant_id(), principal_of(actor), well_known::MANAGE_ROLES)
            .await?;

        let existing = self
            .roles
            .find_role(actor.tenant_id(), role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        let permission_ids = match &input.permission_ids {
            Some(ids) => self.validated_grant_set(ids).await?,
            None => existing.permission_ids,
        };
        let name = input.name.unwrap_or(existing.name);
        let description = input.description.or(existing.description);

        let role = Role::new(role_id, name, description, permission_ids)?;
        self.roles.update_role(actor.tenant_id(), role.clone()).await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: actor.tenant_id(),
                subject: actor.principal_id().to_string(),
                action: AuditAction::RoleUpdated,
                resource_type: "rbac_role".to_owned(),
                resource_id: role.id.to_string(),
                detail: Some(format!(
                    "updated role '{}' to {} grant(s)",
                    role.name,
                    role.permission_ids.len()
                )),
            })
            .await?;

        Ok(role)
    }

    /// Deletes a role that no principal currently references.
    pub async fn delete_role(&self, actor: &ActorIdentity, role_id: RoleId) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor.tenant_id(), principal_of(actor), well_known::MANAGE_ROLES)
            .await?;

        let role = self
            .roles
            .find_role(actor.tenant_id(), role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        let bound = self
            .principals
            .count_principals_bound_to_role(actor.tenant_id(), role_id)
            .await?;
        if bound > 0 {
            return Err(AppError::Conflict(format!(
                "cannot delete role '{}': currently assigned to {bound} member(s)",
                role.name
            )));
        }

        // The repository re-validates the binding count in its deleting
        // transaction; this pre-check exists for the friendlier message.
        self.roles.delete_role(actor.tenant_id(), role_id).await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: actor.tenant_id(),
                subject: actor.principal_id().to_string(),
                action: AuditAction::RoleDeleted,
                resource_type: "rbac_role".to_owned(),
                resource_id: role_id.to_string(),
                detail: Some(format!("deleted role '{}'", role.name)),
            })
            .await
    }

    async fn validated_grant_set(
        &self,
        permission_ids: &[PermissionId],
    ) -> AppResult<BTreeSet<PermissionId>> {
        if permission_ids.is_empty() {
            return Err(AppError::Validation(
                "role must grant at least one permission".to_owned(),
            ));
        }

        let mut validated = BTreeSet::new();
        for permission_id in permission_ids {
            if self
                .permissions
                .find_permission(*permission_id)
                .await?
                .is_none()
            {
                return Err(AppError::NotFound(format!(
                    "permission '{permission_id}' was not found"
                )));
            }
            validated.insert(*permission_id);
        }

        Ok(validated)
    }
}
