//! Application services and repository ports for the Huntboard registry.

#![forbid(unsafe_code)]

mod audit;
mod authorization_service;
mod binding_service;
mod permission_registry_service;
mod registry_ports;
mod role_service;

#[cfg(test)]
mod test_support;

pub use audit::{AuditEvent, AuditRepository};
pub use authorization_service::{
    AuthorizationRepository, AuthorizationService, DefaultPermissionProvider,
};
pub use binding_service::{BindingService, BulkFailure, BulkOutcome, DEFAULT_MAX_BULK_BATCH};
pub use permission_registry_service::{
    CreatePermissionInput, PermissionFilter, PermissionRegistryService,
};
pub use registry_ports::{PermissionRepository, PrincipalRepository, RoleRepository};
pub use role_service::{CreateRoleInput, RoleService, UpdateRoleInput};
