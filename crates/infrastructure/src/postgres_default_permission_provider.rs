use async_trait::async_trait;
use sqlx::PgPool;

use huntboard_application::DefaultPermissionProvider;
use huntboard_core::{AppError, AppResult};
use huntboard_domain::{AccountType, PermissionKey};

/// Default-permission table backed by PostgreSQL.
///
/// Rows are seeded by migration and can be adjusted per deployment without a
/// code change.
#[derive(Clone)]
pub struct PostgresDefaultPermissionProvider {
    pool: PgPool,
}

impl PostgresDefaultPermissionProvider {
    /// Creates a provider with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DefaultPermissionProvider for PostgresDefaultPermissionProvider {
    async fn default_permissions(
        &self,
        account_type: AccountType,
    ) -> AppResult<Vec<PermissionKey>> {
        let keys = sqlx::query_scalar::<_, String>(
            r#"
            SELECT permission_key
            FROM account_type_default_permissions
            WHERE account_type = $1
            ORDER BY permission_key
            "#,
        )
        .bind(account_type.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list default permissions: {error}"))
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
