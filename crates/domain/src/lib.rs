//! Domain types for the Huntboard permission and role registry.

#![forbid(unsafe_code)]

/// Audit action vocabulary emitted by registry use-cases.
pub mod audit;
/// Permission catalog types and key validation.
pub mod permission;
/// Principal accounts and role-binding state.
pub mod principal;
/// Named permission bundles and draft-composition helpers.
pub mod role;

pub use audit::AuditAction;
pub use permission::{Permission, PermissionId, PermissionKey, well_known};
pub use principal::{AccountType, EmailAddress, Principal, PrincipalId, RoleBinding};
pub use role::{Role, RoleId, toggle_category};
