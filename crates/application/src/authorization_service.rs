use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use huntboard_core::{AppError, AppResult, TenantId};
use huntboard_domain::{AccountType, PermissionKey, Principal, PrincipalId, RoleBinding, RoleId};

/// Repository port for the lookups behind authorization checks.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Finds a principal within the tenant scope.
    async fn find_principal(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
    ) -> AppResult<Option<Principal>>;

    /// Lists the permission keys granted by a role.
    async fn list_role_permission_keys(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<Vec<PermissionKey>>;
}

/// Port for the externally owned account-type default permission table.
#[async_trait]
pub trait DefaultPermissionProvider: Send + Sync {
    /// Returns the default permission keys for an unbound account type.
    async fn default_permissions(
        &self,
        account_type: AccountType,
    ) -> AppResult<Vec<PermissionKey>>;
}

/// Application service answering "may this principal perform this action".
///
/// The effective set is recomputed from current store state on every call;
/// nothing is cached between requests.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
    defaults: Arc<dyn DefaultPermissionProvider>,
}

impl AuthorizationService {
    /// Creates a new authorization service from its lookup ports.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AuthorizationRepository>,
        defaults: Arc<dyn DefaultPermissionProvider>,
    ) -> Self {
        Self {
            repository,
            defaults,
        }
    }

    /// Resolves the effective permission set for a principal.
    ///
    /// A deactivated principal resolves to the empty set regardless of its
    /// binding; an unbound principal resolves to its account-type defaults.
    pub async fn effective_permissions(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
    ) -> AppResult<BTreeSet<PermissionKey>> {
        let principal = self
            .repository
            .find_principal(tenant_id, principal_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "principal '{principal_id}' was not found in tenant '{tenant_id}'"
                ))
            })?;

        if !principal.is_active {
            return Ok(BTreeSet::new());
        }

        let keys = match principal.binding() {
            RoleBinding::Bound(role_id) => {
                self.repository
                    .list_role_permission_keys(tenant_id, role_id)
                    .await?
            }
            RoleBinding::Default(account_type) => {
                self.defaults.default_permissions(account_type).await?
            }
        };

        Ok(keys.into_iter().collect())
    }

    /// Returns whether the principal currently holds the permission key.
    pub async fn has_permission(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
        key: &str,
    ) -> AppResult<bool> {
        let key = PermissionKey::new(key)?;
        let effective = self.effective_permissions(tenant_id, principal_id).await?;
        Ok(effective.contains(&key))
    }

    /// Ensures the principal holds the permission key.
    pub async fn require_permission(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
        key: &str,
    ) -> AppResult<()> {
        if self.has_permission(tenant_id, principal_id, key).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "principal '{principal_id}' is missing permission '{key}' in tenant '{tenant_id}'"
        )))
    }

    /// Ensures the principal holds at least one of the permission keys.
    ///
    /// Read endpoints are reachable through several administrative grants,
    /// so listings accept any of them.
    pub async fn require_any_permission(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
        keys: &[&str],
    ) -> AppResult<()> {
        for key in keys {
            if self.has_permission(tenant_id, principal_id, key).await? {
                return Ok(());
            }
        }

        Err(AppError::Forbidden(format!(
            "principal '{principal_id}' is missing all of [{}] in tenant '{tenant_id}'",
            keys.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use huntboard_core::{AppError, TenantId};
    use huntboard_domain::{AccountType, PermissionKey, well_known};

    use crate::test_support::{FakeDefaultPermissionProvider, FakeRegistry, principal_fixture};

    use super::AuthorizationService;

    fn key(value: &str) -> PermissionKey {
        PermissionKey::new(value).unwrap_or_else(|_| panic!("test key"))
    }

    fn service(registry: Arc<FakeRegistry>) -> AuthorizationService {
        AuthorizationService::new(
            registry,
            Arc::new(FakeDefaultPermissionProvider::with_admin_defaults()),
        )
    }

    #[tokio::test]
    async fn bound_principal_resolves_role_grants() {
        let tenant_id = TenantId::new();
        let registry = Arc::new(FakeRegistry::default());
        let role_id = registry
            .seed_role(tenant_id, "Triage Lead", &["report:export"])
            .await;
        let mut principal = principal_fixture(AccountType::CompanyEmployee);
        principal.custom_role_id = Some(role_id);
        let principal_id = registry.seed_principal(tenant_id, principal).await;

        let service = service(registry);
        let granted = service
            .has_permission(tenant_id, principal_id, "report:export")
            .await;
        let denied = service
            .has_permission(tenant_id, principal_id, "report:view")
            .await;

        assert_eq!(granted.ok(), Some(true));
        assert_eq!(denied.ok(), Some(false));
    }

    #[tokio::test]
    async fn unbound_principal_resolves_account_type_defaults() {
        let tenant_id = TenantId::new();
        let registry = Arc::new(FakeRegistry::default());
        let principal_id = registry
            .seed_principal(tenant_id, principal_fixture(AccountType::AdminTeam))
            .await;

        let service = service(registry);
        let granted = service
            .has_permission(tenant_id, principal_id, well_known::MANAGE_ROLES)
            .await;

        assert_eq!(granted.ok(), Some(true));
    }

    #[tokio::test]
    async fn deactivated_principal_holds_no_permission_at_all() {
        let tenant_id = TenantId::new();
        let registry = Arc::new(FakeRegistry::default());
        let role_id = registry
            .seed_role(tenant_id, "Triage Lead", &["report:export"])
            .await;
        let mut principal = principal_fixture(AccountType::AdminTeam);
        principal.custom_role_id = Some(role_id);
        principal.is_active = false;
        let principal_id = registry.seed_principal(tenant_id, principal).await;

        let service = service(registry);
        let via_role = service
            .has_permission(tenant_id, principal_id, "report:export")
            .await;
        let effective = service.effective_permissions(tenant_id, principal_id).await;

        assert_eq!(via_role.ok(), Some(false));
        assert_eq!(effective.ok().map(|set| set.len()), Some(0));
    }

    #[tokio::test]
    async fn require_permission_rejects_missing_grant() {
        let tenant_id = TenantId::new();
        let registry = Arc::new(FakeRegistry::default());
        let principal_id = registry
            .seed_principal(tenant_id, principal_fixture(AccountType::ResearcherTeam))
            .await;

        let service = service(registry);
        let result = service
            .require_permission(tenant_id, principal_id, "report:export")
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn unknown_principal_is_not_found() {
        let tenant_id = TenantId::new();
        let registry = Arc::new(FakeRegistry::default());
        let stranger = principal_fixture(AccountType::AdminTeam);

        let service = service(registry);
        let result = service
            .has_permission(tenant_id, stranger.id, "report:export")
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn malformed_key_is_rejected_before_lookup() {
        let tenant_id = TenantId::new();
        let registry = Arc::new(FakeRegistry::default());
        let principal_id = registry
            .seed_principal(tenant_id, principal_fixture(AccountType::AdminTeam))
            .await;

        let service = service(registry);
        let result = service
            .has_permission(tenant_id, principal_id, "not-a-key")
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn effective_set_contains_normalized_keys() {
        let tenant_id = TenantId::new();
        let registry = Arc::new(FakeRegistry::default());
        let role_id = registry
            .seed_role(tenant_id, "Exporter", &["report:export"])
            .await;
        let mut principal = principal_fixture(AccountType::CompanyEmployee);
        principal.custom_role_id = Some(role_id);
        let principal_id = registry.seed_principal(tenant_id, principal).await;

        let service = service(registry);
        let effective = service.effective_permissions(tenant_id, principal_id).await;

        assert_eq!(
            effective.ok(),
            Some([key("report:export")].into_iter().collect())
        );
    }
}
