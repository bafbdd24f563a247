use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;

use huntboard_application::CreatePermissionInput;
use huntboard_core::ActorIdentity;
use huntboard_domain::PermissionId;

use crate::dto::{CreatePermissionRequest, PermissionListQuery, PermissionResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_permissions_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Query(query): Query<PermissionListQuery>,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    let permissions = state
        .permission_registry_service
        .list_permissions(&actor, &query.into())
        .await?
        .into_iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn create_permission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Json(payload): Json<CreatePermissionRequest>,
) -> ApiResult<(StatusCode, Json<PermissionResponse>)> {
    let permission = state
        .permission_registry_service
        .create_permission(
            &actor,
            CreatePermissionInput {
                key: payload.key,
                name: payload.name,
                description: payload.description,
                category: payload.category,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(PermissionResponse::from(permission))))
}

pub async fn delete_permission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorIdentity>,
    Path(permission_id): Path<uuid::Uuid>,
) -> ApiResult<StatusCode> {
    state
        .permission_registry_service
        .delete_permission(&actor, PermissionId::from_uuid(permission_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
