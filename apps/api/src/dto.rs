mod common;
pub(crate) mod principals;
pub(crate) mod roles;
mod permissions;

pub use common::HealthResponse;
pub use permissions::{CreatePermissionRequest, PermissionListQuery, PermissionResponse};
pub use principals::{
    AssignRoleRequest, BulkAssignRoleRequest, BulkOutcomeResponse, BulkToggleStatusRequest,
    PrincipalResponse,
};
pub use roles::{CreateRoleRequest, RoleResponse, UpdateRoleRequest};

#[cfg(test)]
mod tests {
    use super::principals::BulkFailureResponse;
    use super::{
        AssignRoleRequest, BulkAssignRoleRequest, BulkOutcomeResponse, BulkToggleStatusRequest,
        CreatePermissionRequest, CreateRoleRequest, HealthResponse, PermissionResponse,
        PrincipalResponse, RoleResponse, UpdateRoleRequest,
    };

    use crate::error::ErrorResponse;
    use ts_rs::Config;
    use ts_rs::TS;

    #[test]
    fn export_ts_bindings() -> Result<(), ts_rs::ExportError> {
        let config = Config::default();

        CreatePermissionRequest::export(&config)?;
        CreateRoleRequest::export(&config)?;
        UpdateRoleRequest::export(&config)?;
        AssignRoleRequest::export(&config)?;
        BulkAssignRoleRequest::export(&config)?;
        BulkToggleStatusRequest::export(&config)?;
        PermissionResponse::export(&config)?;
        RoleResponse::export(&config)?;
        PrincipalResponse::export(&config)?;
        BulkFailureResponse::export(&config)?;
        BulkOutcomeResponse::export(&config)?;
        ErrorResponse::export(&config)?;
        HealthResponse::export(&config)?;

        Ok(())
    }
}
