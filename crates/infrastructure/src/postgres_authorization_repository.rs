use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use huntboard_application::AuthorizationRepository;
use huntboard_core::{AppError, AppResult, TenantId};
use huntboard_domain::{AccountType, EmailAddress, PermissionKey, Principal, PrincipalId, RoleId};

/// PostgreSQL-backed read model for authorization checks.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PrincipalRow {
    id: uuid::Uuid,
    first_name: String,
    last_name: String,
    email: String,
    is_active: bool,
    account_type: String,
    custom_role_id: Option<uuid::Uuid>,
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn find_principal(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
    ) -> AppResult<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT
                id,
                first_name,
                last_name,
                email,
                is_active,
                account_type,
                custom_role_id
            FROM principals
            WHERE tenant_id = $1
                AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(principal_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load principal: {error}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let account_type = AccountType::from_str(row.account_type.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "invalid stored account type '{}': {error}",
                row.account_type
            ))
        })?;
        let email = EmailAddress::new(row.email.as_str()).map_err(|error| {
            AppError::Internal(format!("invalid stored email '{}': {error}", row.email))
        })?;

        Ok(Some(Principal {
            id: PrincipalId::from_uuid(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            email,
            is_active: row.is_active,
            account_type,
            custom_role_id: row.custom_role_id.map(RoleId::from_uuid),
        }))
    }

    async fn list_role_permission_keys(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<Vec<PermissionKey>> {
        let role_exists = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM rbac_roles
            WHERE tenant_id = $1
                AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role: {error}")))?;

        if role_exists == 0 {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' was not found"
            )));
        }

        let keys = sqlx::query_scalar::<_, String>(
            r#"
            SELECT permissions.key
            FROM rbac_role_permissions AS grants
            INNER JOIN catalog_permissions AS permissions
                ON permissions.id = grants.permission_id
            WHERE grants.role_id = $1
            ORDER BY permissions.key
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list role permission keys: {error}"))
        })?;

        keys.into_iter()
            .map(|key| {
                PermissionKey::new(key.as_str()).map_err(|error| {
                    AppError::Internal(format!("invalid stored permission key '{key}': {error}"))
                })
            })
            .collect()
    }
}
