use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use huntboard_application::PermissionRepository;
use huntboard_core::{AppError, AppResult};
use huntboard_domain::{Permission, PermissionId, PermissionKey};

/// PostgreSQL-backed permission catalog.
#[derive(Clone)]
pub struct PostgresPermissionRepository {
    pool: PgPool,
}

impl PostgresPermissionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: uuid::Uuid,
    key: String,
    name: String,
    description: Option<String>,
    category: String,
}

impl PermissionRow {
    fn into_permission(self) -> AppResult<Permission> {
        let key = PermissionKey::new(self.key.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "invalid stored permission key '{}': {error}",
                self.key
            ))
        })?;

        Permission::new(
            PermissionId::from_uuid(self.id),
            key,
            self.name,
            self.description,
            Some(self.category),
        )
    }
}

#[async_trait]
impl PermissionRepository for PostgresPermissionRepository {
    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, key, name, description, category
            FROM catalog_permissions
            ORDER BY key
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list permissions: {error}")))?;

        rows.into_iter().map(PermissionRow::into_permission).collect()
    }

    async fn find_permission(&self, permission_id: PermissionId) -> AppResult<Option<Permission>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, key, name, description, category
            FROM catalog_permissions
            WHERE id = $1
            "#,
        )
        .bind(permission_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load permission: {error}")))?;

        row.map(PermissionRow::into_permission).transpose()
    }

    async fn find_permission_by_key(&self, key: &PermissionKey) -> AppResult<Option<Permission>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, key, name, description, category
            FROM catalog_permissions
            WHERE key = $1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load permission: {error}")))?;

        row.map(PermissionRow::into_permission).transpose()
    }

    async fn insert_permission(&self, permission: Permission) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO catalog_permissions (id, key, name, description, category)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(permission.id.as_uuid())
        .bind(permission.key.as_str())
        .bind(permission.name.as_str())
        .bind(permission.description.as_deref())
        .bind(permission.category.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| map_key_conflict(error, permission.key.as_str()))?;

        Ok(())
    }

    async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        // Re-checked inside the transaction so a grant added after the
        // service's pre-check still blocks the delete.
        let referencing = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM rbac_role_permissions
            WHERE permission_id = $1
            "#,
        )
        .bind(permission_id.as_uuid())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count permission references: {error}"))
        })?;

        if referencing > 0 {
            return Err(AppError::Conflict(format!(
                "permission '{permission_id}' is referenced by {referencing} role(s)"
            )));
        }

        let rows_affected = sqlx::query(
            r#"
            DELETE FROM catalog_permissions
            WHERE id = $1
            "#,
        )
        .bind(permission_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete permission: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "permission '{permission_id}' was not found"
            )));
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }
}

fn map_key_conflict(error: sqlx::Error, key: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("permission key '{key}' is already registered"));
    }

    AppError::Internal(format!("failed to create permission: {error}"))
}

#[cfg(test)]
mod tests;
