use std::sync::Arc;

use huntboard_core::{ActorIdentity, AppError, AppResult, TenantId};
use huntboard_domain::{AuditAction, Principal, PrincipalId, RoleId, well_known};

use crate::{
    AuditEvent, AuditRepository, AuthorizationService, PrincipalRepository, RoleRepository,
};

fn principal_of(actor: &ActorIdentity) -> PrincipalId {
    PrincipalId::from_uuid(actor.principal_id())
}

/// Default upper bound on ids accepted by one bulk call.
pub const DEFAULT_MAX_BULK_BATCH: usize = 100;

/// One principal a bulk operation could not update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFailure {
    /// The principal that failed.
    pub principal_id: PrincipalId,
    /// Human-readable failure reason.
    pub reason: String,
}

/// Continue-on-error result of a bulk operation.
///
/// `updated_count` always equals the number of rows actually mutated; every
/// skipped id appears in `failures` with its reason.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    /// Number of principals successfully updated.
    pub updated_count: usize,
    /// Principals that could not be updated.
    pub failures: Vec<BulkFailure>,
}

/// Application service owning principal-role bindings and activation flags.
#[derive(Clone)]
pub struct BindingService {
    authorization_service: AuthorizationService,
    principals: Arc<dyn PrincipalRepository>,
    roles: Arc<dyn RoleRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    max_bulk_batch: usize,
}

impl BindingService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        principals: Arc<dyn PrincipalRepository>,
        roles: Arc<dyn RoleRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            principals,
            roles,
            audit_repository,
            max_bulk_batch: DEFAULT_MAX_BULK_BATCH,
        }
    }

    /// Overrides the bulk batch bound; zero falls back to the default.
    #[must_use]
    pub fn with_max_bulk_batch(mut self, max_bulk_batch: usize) -> Self {
        self.max_bulk_batch = if max_bulk_batch == 0 {
            DEFAULT_MAX_BULK_BATCH
        } else {
            max_bulk_batch
        };
        self
    }

    /// Lists tenant principals for administrative users.
    pub async fn list_principals(&self, actor: &ActorIdentity) -> AppResult<Vec<Principal>> {
        self.authorization_service
            .require_any_permission(
                actor.tenant_id(),
                principal_of(actor),
                &[well_known::VIEW_DIRECTORY, well_known::MANAGE_MEMBERS],
            )
            .await?;

        self.principals.list_principals(actor.tenant_id()).await
    }

    /// Binds a role to a principal, or reverts it to its default set.
    ///
    /// `role_id = None` clears the binding; the account-type default
    /// permission set applies from the next authorization check on.
    pub async fn assign_role(
        &self,
        actor: &ActorIdentity,
        principal_id: PrincipalId,
        role_id: Option<RoleId>,
    ) -> AppResult<Principal> {
        self.authorization_service
            .require_permission(
                actor.tenant_id(),
                principal_of(actor),
                well_known::MANAGE_MEMBERS,
            )
            .await?;

        self.ensure_role_in_tenant(actor.tenant_id(), role_id).await?;

        self.principals
            .set_custom_role(actor.tenant_id(), principal_id, role_id)
            .await?;

        let principal = self
            .principals
            .find_principal(actor.tenant_id(), principal_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "principal '{principal_id}' disappeared during role assignment"
                ))
            })?;

        let (action, detail) = match role_id {
            Some(role_id) => (
                AuditAction::RoleAssigned,
                format!("assigned role '{role_id}' to '{principal_id}'"),
            ),
            None => (
                AuditAction::RoleUnassigned,
                format!("reverted '{principal_id}' to its account-type defaults"),
            ),
        };
        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: actor.tenant_id(),
                subject: actor.principal_id().to_string(),
                action,
                resource_type: "principal_role_binding".to_owned(),
                resource_id: principal_id.to_string(),
                detail: Some(detail),
            })
            .await?;

        Ok(principal)
    }

    /// Applies a role binding to many principals, continuing on error.
    pub async fn bulk_assign_role(
        &self,
        actor: &ActorIdentity,
        principal_ids: &[PrincipalId],
        role_id: Option<RoleId>,
    ) -> AppResult<BulkOutcome> {
        self.authorization_service
            .require_permission(
                actor.tenant_id(),
                principal_of(actor),
                well_known::MANAGE_MEMBERS,
            )
            .await?;

        self.ensure_batch_bounds(principal_ids)?;
        // An invalid role fails the whole call; it is not a per-principal
        // condition.
        self.ensure_role_in_tenant(actor.tenant_id(), role_id).await?;

        let mut outcome = BulkOutcome::default();
        for principal_id in principal_ids {
            match self
                .principals
                .set_custom_role(actor.tenant_id(), *principal_id, role_id)
                .await
            {
                Ok(()) => outcome.updated_count += 1,
                Err(error) => outcome.failures.push(BulkFailure {
                    principal_id: *principal_id,
                    reason: error.to_string(),
                }),
            }
        }

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: actor.tenant_id(),
                subject: actor.principal_id().to_string(),
                action: AuditAction::BulkRoleAssigned,
                resource_type: "principal_role_binding".to_owned(),
                resource_id: match role_id {
                    Some(role_id) => role_id.to_string(),
                    None => "default".to_owned(),
                },
                detail: Some(format!(
                    "bulk role assignment updated {} of {} principal(s)",
                    outcome.updated_count,
                    principal_ids.len()
                )),
            })
            .await?;

        Ok(outcome)
    }

    /// Sets the activation flag on many principals, continuing on error.
    ///
    /// Bindings are left untouched; a later reactivation restores the same
    /// effective permission set.
    pub async fn bulk_toggle_active(
        &self,
        actor: &ActorIdentity,
        principal_ids: &[PrincipalId],
        is_active: bool,
    ) -> AppResult<BulkOutcome> {
        self.authorization_service
            .require_permission(
                actor.tenant_id(),
                principal_of(actor),
                well_known::MANAGE_MEMBERS,
            )
            .await?;

        self.ensure_batch_bounds(principal_ids)?;

        let mut outcome = BulkOutcome::default();
        for principal_id in principal_ids {
            match self
                .principals
                .set_active(actor.tenant_id(), *principal_id, is_active)
                .await
            {
                Ok(()) => outcome.updated_count += 1,
                Err(error) => outcome.failures.push(BulkFailure {
                    principal_id: *principal_id,
                    reason: error.to_string(),
                }),
            }
        }

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: actor.tenant_id(),
                subject: actor.principal_id().to_string(),
                action: AuditAction::BulkStatusToggled,
                resource_type: "principal".to_owned(),
                resource_id: if is_active { "activated" } else { "deactivated" }.to_owned(),
                detail: Some(format!(
                    "bulk status toggle updated {} of {} principal(s)",
                    outcome.updated_count,
                    principal_ids.len()
                )),
            })
            .await?;

        Ok(outcome)
    }

    fn ensure_batch_bounds(&self, principal_ids: &[PrincipalId]) -> AppResult<()> {
        if principal_ids.is_empty() {
            return Err(AppError::Validation(
                "bulk operation requires at least one principal id".to_owned(),
            ));
        }

        if principal_ids.len() > self.max_bulk_batch {
            return Err(AppError::Validation(format!(
                "bulk operations accept at most {} principals per call",
                self.max_bulk_batch
            )));
        }

        Ok(())
    }

    async fn ensure_role_in_tenant(
        &self,
        tenant_id: TenantId,
        role_id: Option<RoleId>,
    ) -> AppResult<()> {
        let Some(role_id) = role_id else {
            return Ok(());
        };

        match self.roles.find_role_tenant(role_id).await? {
            None => Err(AppError::NotFound(format!("role '{role_id}' was not found"))),
            Some(owner) if owner != tenant_id => Err(AppError::Forbidden(format!(
                "role '{role_id}' belongs to a different tenant"
            ))),
            Some(_) => Ok(()),
        }
    }
}
