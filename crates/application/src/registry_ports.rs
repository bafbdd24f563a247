use async_trait::async_trait;
use huntboard_core::{AppResult, TenantId};
use huntboard_domain::{Permission, PermissionId, PermissionKey, Principal, PrincipalId, Role, RoleId};

/// Repository port for the platform-global permission catalog.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Lists every catalog permission, ordered by key.
    async fn list_permissions(&self) -> AppResult<Vec<Permission>>;

    /// Finds a permission by identifier.
    async fn find_permission(&self, permission_id: PermissionId) -> AppResult<Option<Permission>>;

    /// Finds a permission by its normalized key.
    async fn find_permission_by_key(&self, key: &PermissionKey) -> AppResult<Option<Permission>>;

    /// Inserts a new permission; fails with a conflict when the key exists.
    async fn insert_permission(&self, permission: Permission) -> AppResult<()>;

    /// Deletes a permission.
    ///
    /// Fails with a conflict while any role still references it; the check
    /// and the delete happen against the same snapshot.
    async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<()>;
}

/// Repository port for tenant-scoped custom roles.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Lists tenant roles ordered by name.
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>>;

    /// Finds a role within the tenant scope.
    async fn find_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Returns the owning tenant of a role, if the role exists at all.
    async fn find_role_tenant(&self, role_id: RoleId) -> AppResult<Option<TenantId>>;

    /// Inserts a role; fails with a conflict on a duplicate tenant-scoped name.
    async fn insert_role(&self, tenant_id: TenantId, role: Role) -> AppResult<()>;

    /// Replaces a role's metadata and full grant set.
    async fn update_role(&self, tenant_id: TenantId, role: Role) -> AppResult<()>;

    /// Deletes a role.
    ///
    /// Fails with a conflict while any principal binding references it; the
    /// check and the delete happen against the same snapshot.
    async fn delete_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<()>;

    /// Counts roles across all tenants that grant the given permission.
    async fn count_roles_referencing_permission(
        &self,
        permission_id: PermissionId,
    ) -> AppResult<u64>;
}

/// Repository port for principal accounts and their role bindings.
///
/// This port owns the `custom_role_id` and `is_active` columns; role and
/// permission rows are never written through it.
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    /// Lists tenant principals ordered by name.
    async fn list_principals(&self, tenant_id: TenantId) -> AppResult<Vec<Principal>>;

    /// Finds a principal within the tenant scope.
    async fn find_principal(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
    ) -> AppResult<Option<Principal>>;

    /// Finds a principal by identifier alone, returning its tenant.
    ///
    /// Used by request middleware, which only holds the gateway-supplied
    /// principal id.
    async fn find_principal_in_any_tenant(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Option<(TenantId, Principal)>>;

    /// Sets or clears a principal's custom role binding.
    async fn set_custom_role(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
        role_id: Option<RoleId>,
    ) -> AppResult<()>;

    /// Sets a principal's activation flag without touching its binding.
    async fn set_active(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
        is_active: bool,
    ) -> AppResult<()>;

    /// Counts tenant principals currently bound to the given role.
    async fn count_principals_bound_to_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<u64>;
}
