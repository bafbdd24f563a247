//! Shared in-memory fakes for service tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use huntboard_core::{AppError, AppResult, TenantId};
use huntboard_domain::{
    AccountType, EmailAddress, Permission, PermissionId, PermissionKey, Principal, PrincipalId,
    Role, RoleId, well_known,
};

use crate::{
    AuditEvent, AuditRepository, AuthorizationRepository, DefaultPermissionProvider,
    PermissionRepository, PrincipalRepository, RoleRepository,
};

#[derive(Default)]
struct RegistryState {
    permissions: BTreeMap<PermissionId, Permission>,
    roles: BTreeMap<RoleId, (TenantId, Role)>,
    principals: BTreeMap<PrincipalId, (TenantId, Principal)>,
}

/// One fake store implementing every repository port.
#[derive(Default)]
pub(crate) struct FakeRegistry {
    state: Mutex<RegistryState>,
}

impl FakeRegistry {
    pub(crate) async fn seed_permission(&self, key: &str, name: &str) -> PermissionId {
        let key = PermissionKey::new(key).unwrap_or_else(|_| panic!("fixture key"));
        let mut state = self.state.lock().await;
        if let Some(existing) = state.permissions.values().find(|p| p.key == key) {
            return existing.id;
        }

        let permission = Permission::new(PermissionId::new(), key, name, None, None)
            .unwrap_or_else(|_| panic!("fixture permission"));
        let id = permission.id;
        state.permissions.insert(id, permission);
        id
    }

    pub(crate) async fn seed_role(&self, tenant_id: TenantId, name: &str, keys: &[&str]) -> RoleId {
        let mut permission_ids = std::collections::BTreeSet::new();
        for key in keys {
            permission_ids.insert(self.seed_permission(key, key).await);
        }

        let role = Role::new(RoleId::new(), name, None, permission_ids)
            .unwrap_or_else(|_| panic!("fixture role"));
        let id = role.id;
        self.state.lock().await.roles.insert(id, (tenant_id, role));
        id
    }

    pub(crate) async fn seed_principal(
        &self,
        tenant_id: TenantId,
        principal: Principal,
    ) -> PrincipalId {
        let id = principal.id;
        self.state
            .lock()
            .await
            .principals
            .insert(id, (tenant_id, principal));
        id
    }

    pub(crate) async fn principal(&self, principal_id: PrincipalId) -> Option<Principal> {
        self.state
            .lock()
            .await
            .principals
            .get(&principal_id)
            .map(|(_, principal)| principal.clone())
    }
}

#[async_trait]
impl PermissionRepository for FakeRegistry {
    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        let state = self.state.lock().await;
        let mut values: Vec<Permission> = state.permissions.values().cloned().collect();
        values.sort_by(|left, right| left.key.cmp(&right.key));
        Ok(values)
    }

    async fn find_permission(&self, permission_id: PermissionId) -> AppResult<Option<Permission>> {
        Ok(self.state.lock().await.permissions.get(&permission_id).cloned())
    }

    async fn find_permission_by_key(&self, key: &PermissionKey) -> AppResult<Option<Permission>> {
        Ok(self
            .state
            .lock()
            .await
            .permissions
            .values()
            .find(|permission| &permission.key == key)
            .cloned())
    }

    async fn insert_permission(&self, permission: Permission) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state
            .permissions
            .values()
            .any(|existing| existing.key == permission.key)
        {
            return Err(AppError::Conflict(format!(
                "permission key '{}' is already registered",
                permission.key
            )));
        }

        state.permissions.insert(permission.id, permission);
        Ok(())
    }

    async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let referencing = state
            .roles
            .values()
            .filter(|(_, role)| role.permission_ids.contains(&permission_id))
            .count();
        if referencing > 0 {
            return Err(AppError::Conflict(format!(
                "permission '{permission_id}' is referenced by {referencing} role(s)"
            )));
        }

        if state.permissions.remove(&permission_id).is_none() {
            return Err(AppError::NotFound(format!(
                "permission '{permission_id}' was not found"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl RoleRepository for FakeRegistry {
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        let state = self.state.lock().await;
        let mut values: Vec<Role> = state
            .roles
            .values()
            .filter_map(|(stored_tenant, role)| {
                (stored_tenant == &tenant_id).then_some(role.clone())
            })
            .collect();
        values.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(values)
    }

    async fn find_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .state
            .lock()
            .await
            .roles
            .get(&role_id)
            .filter(|(stored_tenant, _)| stored_tenant == &tenant_id)
            .map(|(_, role)| role.clone()))
    }

    async fn find_role_tenant(&self, role_id: RoleId) -> AppResult<Option<TenantId>> {
        Ok(self
            .state
            .lock()
            .await
            .roles
            .get(&role_id)
            .map(|(tenant_id, _)| *tenant_id))
    }

    async fn insert_role(&self, tenant_id: TenantId, role: Role) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.roles.values().any(|(stored_tenant, existing)| {
            stored_tenant == &tenant_id && existing.name.eq_ignore_ascii_case(&role.name)
        }) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                role.name
            )));
        }

        state.roles.insert(role.id, (tenant_id, role));
        Ok(())
    }

    async fn update_role(&self, tenant_id: TenantId, role: Role) -> AppResult<()> {
        let mut state = self.state.lock().await;
        match state.roles.get(&role.id) {
            Some((stored_tenant, _)) if stored_tenant == &tenant_id => {
                state.roles.insert(role.id, (tenant_id, role));
                Ok(())
            }
            _ => Err(AppError::NotFound(format!(
                "role '{}' was not found",
                role.id
            ))),
        }
    }

    async fn delete_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let bound = state
            .principals
            .values()
            .filter(|(stored_tenant, principal)| {
                stored_tenant == &tenant_id && principal.custom_role_id == Some(role_id)
            })
            .count();
        if bound > 0 {
            return Err(AppError::Conflict(format!(
                "role '{role_id}' is assigned to {bound} member(s)"
            )));
        }

        match state.roles.get(&role_id) {
            Some((stored_tenant, _)) if stored_tenant == &tenant_id => {
                state.roles.remove(&role_id);
                Ok(())
            }
            _ => Err(AppError::NotFound(format!("role '{role_id}' was not found"))),
        }
    }

    async fn count_roles_referencing_permission(
        &self,
        permission_id: PermissionId,
    ) -> AppResult<u64> {
        Ok(self
            .state
            .lock()
            .await
            .roles
            .values()
            .filter(|(_, role)| role.permission_ids.contains(&permission_id))
            .count() as u64)
    }
}

#[async_trait]
impl PrincipalRepository for FakeRegistry {
    async fn list_principals(&self, tenant_id: TenantId) -> AppResult<Vec<Principal>> {
        let state = self.state.lock().await;
        let mut values: Vec<Principal> = state
            .principals
            .values()
            .filter_map(|(stored_tenant, principal)| {
                (stored_tenant == &tenant_id).then_some(principal.clone())
            })
            .collect();
        values.sort_by(|left, right| {
            (&left.last_name, &left.first_name).cmp(&(&right.last_name, &right.first_name))
        });
        Ok(values)
    }

    async fn find_principal(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
    ) -> AppResult<Option<Principal>> {
        Ok(self
            .state
            .lock()
            .await
            .principals
            .get(&principal_id)
            .filter(|(stored_tenant, _)| stored_tenant == &tenant_id)
            .map(|(_, principal)| principal.clone()))
    }

    async fn find_principal_in_any_tenant(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Option<(TenantId, Principal)>> {
        Ok(self.state.lock().await.principals.get(&principal_id).cloned())
    }

    async fn set_custom_role(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
        role_id: Option<RoleId>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        match state.principals.get_mut(&principal_id) {
            Some((stored_tenant, principal)) if stored_tenant == &tenant_id => {
                principal.custom_role_id = role_id;
                Ok(())
            }
            _ => Err(AppError::NotFound(format!(
                "principal '{principal_id}' was not found in tenant '{tenant_id}'"
            ))),
        }
    }

    async fn set_active(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
        is_active: bool,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        match state.principals.get_mut(&principal_id) {
            Some((stored_tenant, principal)) if stored_tenant == &tenant_id => {
                principal.is_active = is_active;
                Ok(())
            }
            _ => Err(AppError::NotFound(format!(
                "principal '{principal_id}' was not found in tenant '{tenant_id}'"
            ))),
        }
    }

    async fn count_principals_bound_to_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<u64> {
        Ok(self
            .state
            .lock()
            .await
            .principals
            .values()
            .filter(|(stored_tenant, principal)| {
                stored_tenant == &tenant_id && principal.custom_role_id == Some(role_id)
            })
            .count() as u64)
    }
}

#[async_trait]
impl AuthorizationRepository for FakeRegistry {
    async fn find_principal(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
    ) -> AppResult<Option<Principal>> {
        PrincipalRepository::find_principal(self, tenant_id, principal_id).await
    }

    async fn list_role_permission_keys(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<Vec<PermissionKey>> {
        let state = self.state.lock().await;
        let Some((stored_tenant, role)) = state.roles.get(&role_id) else {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        };
        if stored_tenant != &tenant_id {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        Ok(role
            .permission_ids
            .iter()
            .filter_map(|id| state.permissions.get(id).map(|p| p.key.clone()))
            .collect())
    }
}

/// Fake default-permission table keyed by account type.
#[derive(Default)]
pub(crate) struct FakeDefaultPermissionProvider {
    map: HashMap<AccountType, Vec<PermissionKey>>,
}

impl FakeDefaultPermissionProvider {
    /// Grants every well-known administrative key to the admin account type.
    pub(crate) fn with_admin_defaults() -> Self {
        let admin_keys = [
            well_known::MANAGE_PERMISSIONS,
            well_known::MANAGE_ROLES,
            well_known::MANAGE_MEMBERS,
            well_known::VIEW_DIRECTORY,
        ]
        .iter()
        .map(|key| PermissionKey::new(*key).unwrap_or_else(|_| panic!("fixture key")))
        .collect();

        let mut map = HashMap::new();
        map.insert(AccountType::AdminTeam, admin_keys);
        Self { map }
    }
}

#[async_trait]
impl DefaultPermissionProvider for FakeDefaultPermissionProvider {
    async fn default_permissions(
        &self,
        account_type: AccountType,
    ) -> AppResult<Vec<PermissionKey>> {
        Ok(self.map.get(&account_type).cloned().unwrap_or_default())
    }
}

/// Audit sink backed by a mutex-guarded vector.
#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    pub(crate) events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

/// Builds an active principal with fresh identifiers.
pub(crate) fn principal_fixture(account_type: AccountType) -> Principal {
    Principal {
        id: PrincipalId::new(),
        first_name: "Ada".to_owned(),
        last_name: "Reyes".to_owned(),
        email: EmailAddress::new(format!("{}@example.com", uuid::Uuid::new_v4()))
            .unwrap_or_else(|_| panic!("fixture email")),
        is_active: true,
        account_type,
        custom_role_id: None,
    }
}
