use std::sync::Arc;

use huntboard_application::{
    BindingService, PermissionRegistryService, PrincipalRepository, RoleRepository, RoleService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub permission_registry_service: PermissionRegistryService,
    pub role_service: RoleService,
    pub binding_service: BindingService,
    pub principal_repository: Arc<dyn PrincipalRepository>,
    pub role_repository: Arc<dyn RoleRepository>,
    pub frontend_url: String,
}
