use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use huntboard_application::PrincipalRepository;
use huntboard_core::{AppError, AppResult, TenantId};
use huntboard_domain::{AccountType, EmailAddress, Principal, PrincipalId, RoleId};

/// PostgreSQL-backed principal store.
#[derive(Clone)]
pub struct PostgresPrincipalRepository {
    pool: PgPool,
}

impl PostgresPrincipalRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PrincipalRow {
    id: uuid::Uuid,
    tenant_id: uuid::Uuid,
    first_name: String,
    last_name: String,
    email: String,
    is_active: bool,
    account_type: String,
    custom_role_id: Option<uuid::Uuid>,
}

impl PrincipalRow {
    fn into_principal(self) -> AppResult<Principal> {
        let account_type = AccountType::from_str(self.account_type.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "invalid stored account type '{}': {error}",
                self.account_type
            ))
        })?;
        let email = EmailAddress::new(self.email.as_str()).map_err(|error| {
            AppError::Internal(format!("invalid stored email '{}': {error}", self.email))
        })?;

        Ok(Principal {
            id: PrincipalId::from_uuid(self.id),
            first_name: self.first_name,
            last_name: self.last_name,
            email,
            is_active: self.is_active,
            account_type,
            custom_role_id: self.custom_role_id.map(RoleId::from_uuid),
        })
    }
}

const PRINCIPAL_COLUMNS: &str = r#"
    id,
    tenant_id,
    first_name,
    last_name,
    email,
    is_active,
    account_type,
    custom_role_id
"#;

#[async_trait]
impl PrincipalRepository for PostgresPrincipalRepository {
    async fn list_principals(&self, tenant_id: TenantId) -> AppResult<Vec<Principal>> {
        let rows = sqlx::query_as::<_, PrincipalRow>(&format!(
            r#"
            SELECT {PRINCIPAL_COLUMNS}
            FROM principals
            WHERE tenant_id = $1
            ORDER BY last_name, first_name
            "#
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list principals: {error}")))?;

        rows.into_iter().map(PrincipalRow::into_principal).collect()
    }

    async fn find_principal(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
    ) -> AppResult<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(&format!(
            r#"
            SELECT {PRINCIPAL_COLUMNS}
            FROM principals
            WHERE tenant_id = $1
                AND id = $2
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(principal_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load principal: {error}")))?;

        row.map(PrincipalRow::into_principal).transpose()
    }

    async fn find_principal_in_any_tenant(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Option<(TenantId, Principal)>> {
        let row = sqlx::query_as::<_, PrincipalRow>(&format!(
            r#"
            SELECT {PRINCIPAL_COLUMNS}
            FROM principals
            WHERE id = $1
            "#
        ))
        .bind(principal_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load principal: {error}")))?;

        row.map(|row| {
            let tenant_id = TenantId::from_uuid(row.tenant_id);
            Ok((tenant_id, row.into_principal()?))
        })
        .transpose()
    }

    async fn set_custom_role(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
        role_id: Option<RoleId>,
    ) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE principals
            SET custom_role_id = $3,
                updated_at = now()
            WHERE tenant_id = $1
                AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(principal_id.as_uuid())
        .bind(role_id.map(|role_id| role_id.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| map_unknown_role(error, role_id))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "principal '{principal_id}' was not found in tenant '{tenant_id}'"
            )));
        }

        Ok(())
    }

    async fn set_active(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
        is_active: bool,
    ) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE principals
            SET is_active = $3,
                updated_at = now()
            WHERE tenant_id = $1
                AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(principal_id.as_uuid())
        .bind(is_active)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to update principal status: {error}"))
        })?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "principal '{principal_id}' was not found in tenant '{tenant_id}'"
            )));
        }

        Ok(())
    }

    async fn count_principals_bound_to_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM principals
            WHERE tenant_id = $1
                AND custom_role_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count role bindings: {error}")))?;

        Ok(count.unsigned_abs())
    }
}

fn map_unknown_role(error: sqlx::Error, role_id: Option<RoleId>) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23503")
        && let Some(role_id) = role_id
    {
        return AppError::NotFound(format!("role '{role_id}' was not found"));
    }

    AppError::Internal(format!("failed to update role binding: {error}"))
}
