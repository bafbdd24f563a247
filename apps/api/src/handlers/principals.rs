use std::collections::HashMap;

use axum::Json;
use axum::extract::{Extension, Path, State};

use huntboard_core::ActorIdentity;
use huntboard_domain::RoleId;

use crate::dto::principals::{parse_principal_id, parse_role_id};
use crate::dto::{
    AssignRoleRequest, BulkAssignRoleRequest, BulkOutcomeResponse, BulkToggleStatusRequest,
    PrincipalResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_principals_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
) -> ApiResult<Json<Vec<PrincipalResponse>>> {
    let principals = state.binding_service.list_principals(&actor).await?;

    // Name lookup stays within the actor's tenant.
    let role_names: HashMap<RoleId, String> = state
        .role_repository
        .list_roles(actor.tenant_id())
        .await?
        .into_iter()
        .map(|role| (role.id, role.name))
        .collect();

    let principals = principals
        .into_iter()
        .map(|principal| {
            let bound_role_name = principal
                .custom_role_id
                .and_then(|role_id| role_names.get(&role_id).cloned());
            PrincipalResponse::from_principal(principal, bound_role_name)
        })
        .collect();

    Ok(Json(principals))
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(principal_id): Path<String>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<Json<PrincipalResponse>> {
    let principal_id = parse_principal_id(principal_id.as_str())?;
    let role_id = parse_role_id(payload.role_id.as_deref())?;

    let principal = state
        .binding_service
        .assign_role(&actor, principal_id, role_id)
        .await?;

    let bound_role_name = match principal.custom_role_id {
        Some(role_id) => state
            .role_repository
            .find_role(actor.tenant_id(), role_id)
            .await?
            .map(|role| role.name),
        None => None,
    };

    Ok(Json(PrincipalResponse::from_principal(
        principal,
        bound_role_name,
    )))
}

pub async fn bulk_assign_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Json(payload): Json<BulkAssignRoleRequest>,
) -> ApiResult<Json<BulkOutcomeResponse>> {
    let principal_ids = payload
        .principal_ids
        .iter()
        .map(|value| parse_principal_id(value.as_str()))
        .collect::<Result<Vec<_>, _>>()?;
    let role_id = parse_role_id(payload.role_id.as_deref())?;

    let outcome = state
        .binding_service
        .bulk_assign_role(&actor, &principal_ids, role_id)
        .await?;

    Ok(Json(BulkOutcomeResponse::from(outcome)))
}

pub async fn bulk_toggle_status_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Json(payload): Json<BulkToggleStatusRequest>,
) -> ApiResult<Json<BulkOutcomeResponse>> {
    let principal_ids = payload
        .principal_ids
        .iter()
        .map(|value| parse_principal_id(value.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    let outcome = state
        .binding_service
        .bulk_toggle_active(&actor, &principal_ids, payload.is_active)
        .await?;

    Ok(Json(BulkOutcomeResponse::from(outcome)))
}
