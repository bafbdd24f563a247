use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;

use huntboard_application::{CreateRoleInput, UpdateRoleInput};
use huntboard_core::ActorIdentity;
use huntboard_domain::RoleId;

use crate::dto::roles::parse_permission_ids;
use crate::dto::{CreateRoleRequest, RoleResponse, UpdateRoleRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .role_service
        .list_roles(&actor)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let permission_ids = parse_permission_ids(&payload.permission_ids)?;

    let role = state
        .role_service
        .create_role(
            &actor,
            CreateRoleInput {
                name: payload.name,
                description: payload.description,
                permission_ids,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(role_id): Path<uuid::Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let permission_ids = payload
        .permission_ids
        .as_deref()
        .map(parse_permission_ids)
        .transpose()?;

    let role = state
        .role_service
        .update_role(
            &actor,
            RoleId::from_uuid(role_id),
            UpdateRoleInput {
                name: payload.name,
                description: payload.description,
                permission_ids,
            },
        )
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(role_id): Path<uuid::Uuid>,
) -> ApiResult<StatusCode> {
    state
        .role_service
        .delete_role(&actor, RoleId::from_uuid(role_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
