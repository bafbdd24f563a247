//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_audit_repository;
mod in_memory_registry_repository;
mod postgres_audit_repository;
mod postgres_authorization_repository;
mod postgres_default_permission_provider;
mod postgres_permission_repository;
mod postgres_principal_repository;
mod postgres_role_repository;
mod static_default_permission_provider;

pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_registry_repository::InMemoryRegistryRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_default_permission_provider::PostgresDefaultPermissionProvider;
pub use postgres_permission_repository::PostgresPermissionRepository;
pub use postgres_principal_repository::PostgresPrincipalRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use static_default_permission_provider::StaticDefaultPermissionProvider;
