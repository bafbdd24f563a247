use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use huntboard_application::{
    AuthorizationRepository, PermissionRepository, PrincipalRepository, RoleRepository,
};
use huntboard_core::{AppError, AppResult, TenantId};
use huntboard_domain::{
    Permission, PermissionId, PermissionKey, Principal, PrincipalId, Role, RoleId,
};

#[derive(Debug, Default)]
struct RegistryState {
    permissions: HashMap<PermissionId, Permission>,
    roles: HashMap<RoleId, (TenantId, Role)>,
    principals: HashMap<PrincipalId, (TenantId, Principal)>,
}

/// In-memory registry store implementing every repository port.
///
/// All collections live behind one lock so reference checks (permission in
/// use, role still bound) observe the same snapshot they mutate.
#[derive(Debug, Default)]
pub struct InMemoryRegistryRepository {
    state: RwLock<RegistryState>,
}

impl InMemoryRegistryRepository {
    /// Creates an empty in-memory registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a principal directly, bypassing authorization.
    pub async fn seed_principal(&self, tenant_id: TenantId, principal: Principal) {
        self.state
            .write()
            .await
            .principals
            .insert(principal.id, (tenant_id, principal));
    }
}

#[async_trait]
impl PermissionRepository for InMemoryRegistryRepository {
    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        let state = self.state.read().await;

        let mut values: Vec<Permission> = state.permissions.values().cloned().collect();
        values.sort_by(|left, right| left.key.cmp(&right.key));

        Ok(values)
    }

    async fn find_permission(&self, permission_id: PermissionId) -> AppResult<Option<Permission>> {
        Ok(self
            .state
            .read()
            .await
            .permissions
            .get(&permission_id)
            .cloned())
    }

    async fn find_permission_by_key(&self, key: &PermissionKey) -> AppResult<Option<Permission>> {
        Ok(self
            .state
            .read()
            .await
            .permissions
            .values()
            .find(|permission| &permission.key == key)
            .cloned())
    }

    async fn insert_permission(&self, permission: Permission) -> AppResult<()> {
        let mut state = self.state.write().await;

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
        let mut state = self.state.write().await;

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
impl RoleRepository for InMemoryRegistryRepository {
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        let state = self.state.read().await;

        let mut values: Vec<Role> = state
            .roles
            .values()
            .filter_map(|(stored_tenant_id, role)| {
                (stored_tenant_id == &tenant_id).then_some(role.clone())
            })
            .collect();
        values.sort_by(|left, right| left.name.cmp(&right.name));

        Ok(values)
    }

    async fn find_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .state
            .read()
            .await
            .roles
            .get(&role_id)
            .filter(|(stored_tenant_id, _)| stored_tenant_id == &tenant_id)
            .map(|(_, role)| role.clone()))
    }

    async fn find_role_tenant(&self, role_id: RoleId) -> AppResult<Option<TenantId>> {
        Ok(self
            .state
            .read()
            .await
            .roles
            .get(&role_id)
            .map(|(tenant_id, _)| *tenant_id))
    }

    async fn insert_role(&self, tenant_id: TenantId, role: Role) -> AppResult<()> {
        let mut state = self.state.write().await;

        ensure_role_permissions_exist(&state, &role)?;
        if state.roles.values().any(|(stored_tenant_id, existing)| {
            stored_tenant_id == &tenant_id && existing.name.eq_ignore_ascii_case(&role.name)
        }) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists in this tenant",
                role.name
            )));
        }

        state.roles.insert(role.id, (tenant_id, role));
        Ok(())
    }

    async fn update_role(&self, tenant_id: TenantId, role: Role) -> AppResult<()> {
        let mut state = self.state.write().await;

        ensure_role_permissions_exist(&state, &role)?;
        if state.roles.values().any(|(stored_tenant_id, existing)| {
            stored_tenant_id == &tenant_id
                && existing.id != role.id
                && existing.name.eq_ignore_ascii_case(&role.name)
        }) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists in this tenant",
                role.name
            )));
        }

        match state.roles.get(&role.id) {
            Some((stored_tenant_id, _)) if stored_tenant_id == &tenant_id => {
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
        let mut state = self.state.write().await;

        let bound = state
            .principals
            .values()
            .filter(|(stored_tenant_id, principal)| {
                stored_tenant_id == &tenant_id && principal.custom_role_id == Some(role_id)
            })
            .count();
        if bound > 0 {
            return Err(AppError::Conflict(format!(
                "role '{role_id}' is assigned to {bound} member(s)"
            )));
        }

        match state.roles.get(&role_id) {
            Some((stored_tenant_id, _)) if stored_tenant_id == &tenant_id => {
                state.roles.remove(&role_id);
                Ok(())
            }
            _ => Err(AppError::NotFound(format!(
                "role '{role_id}' was not found"
            ))),
        }
    }

    async fn count_roles_referencing_permission(
        &self,
        permission_id: PermissionId,
    ) -> AppResult<u64> {
        Ok(self
            .state
            .read()
            .await
            .roles
            .values()
            .filter(|(_, role)| role.permission_ids.contains(&permission_id))
            .count() as u64)
    }
}

#[async_trait]
impl PrincipalRepository for InMemoryRegistryRepository {
    async fn list_principals(&self, tenant_id: TenantId) -> AppResult<Vec<Principal>> {
        let state = self.state.read().await;

        let mut values: Vec<Principal> = state
            .principals
            .values()
            .filter_map(|(stored_tenant_id, principal)| {
                (stored_tenant_id == &tenant_id).then_some(principal.clone())
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
            .read()
            .await
            .principals
            .get(&principal_id)
            .filter(|(stored_tenant_id, _)| stored_tenant_id == &tenant_id)
            .map(|(_, principal)| principal.clone()))
    }

    async fn find_principal_in_any_tenant(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Option<(TenantId, Principal)>> {
        Ok(self
            .state
            .read()
            .await
            .principals
            .get(&principal_id)
            .cloned())
    }

    async fn set_custom_role(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
        role_id: Option<RoleId>,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;

        if let Some(role_id) = role_id
            && !state.roles.contains_key(&role_id)
        {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' was not found"
            )));
        }

        match state.principals.get_mut(&principal_id) {
            Some((stored_tenant_id, principal)) if stored_tenant_id == &tenant_id => {
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
        let mut state = self.state.write().await;

        match state.principals.get_mut(&principal_id) {
            Some((stored_tenant_id, principal)) if stored_tenant_id == &tenant_id => {
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
            .read()
            .await
            .principals
            .values()
            .filter(|(stored_tenant_id, principal)| {
                stored_tenant_id == &tenant_id && principal.custom_role_id == Some(role_id)
            })
            .count() as u64)
    }
}

#[async_trait]
impl AuthorizationRepository for InMemoryRegistryRepository {
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
        let state = self.state.read().await;

        let Some((stored_tenant_id, role)) = state.roles.get(&role_id) else {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' was not found"
            )));
        };
        if stored_tenant_id != &tenant_id {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' was not found"
            )));
        }

        Ok(role
            .permission_ids
            .iter()
            .filter_map(|permission_id| {
                state
                    .permissions
                    .get(permission_id)
                    .map(|permission| permission.key.clone())
            })
            .collect())
    }
}

fn ensure_role_permissions_exist(state: &RegistryState, role: &Role) -> AppResult<()> {
    for permission_id in &role.permission_ids {
        if !state.permissions.contains_key(permission_id) {
            return Err(AppError::NotFound(format!(
                "permission '{permission_id}' was not found"
            )));
        }
    }

    Ok(())
}
