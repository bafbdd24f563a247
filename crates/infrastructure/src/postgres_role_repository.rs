use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use huntboard_application::RoleRepository;
use huntboard_core::{AppError, AppResult, TenantId};
use huntboard_domain::{PermissionId, Role, RoleId};

/// PostgreSQL-backed role store.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role_id: uuid::Uuid,
    role_name: String,
    description: Option<String>,
    permission_id: Option<uuid::Uuid>,
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                roles.id AS role_id,
                roles.name AS role_name,
                roles.description,
                grants.permission_id
            FROM rbac_roles AS roles
            LEFT JOIN rbac_role_permissions AS grants
                ON grants.role_id = roles.id
            WHERE roles.tenant_id = $1
            ORDER BY roles.name
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        aggregate_roles(rows)
    }

    async fn find_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                roles.id AS role_id,
                roles.name AS role_name,
                roles.description,
                grants.permission_id
            FROM rbac_roles AS roles
            LEFT JOIN rbac_role_permissions AS grants
                ON grants.role_id = roles.id
            WHERE roles.tenant_id = $1
                AND roles.id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        Ok(aggregate_roles(rows)?.pop())
    }

    async fn find_role_tenant(&self, role_id: RoleId) -> AppResult<Option<TenantId>> {
        let tenant = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            SELECT tenant_id
            FROM rbac_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role tenant: {error}")))?;

        Ok(tenant.map(TenantId::from_uuid))
    }

    async fn insert_role(&self, tenant_id: TenantId, role: Role) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO rbac_roles (id, tenant_id, name, description)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(role.id.as_uuid())
        .bind(tenant_id.as_uuid())
        .bind(role.name.as_str())
        .bind(role.description.as_deref())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_name_conflict(error, role.name.as_str()))?;

        replace_role_grants(&mut transaction, role.id, &role.permission_ids).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn update_role(&self, tenant_id: TenantId, role: Role) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let rows_affected = sqlx::query(
            r#"
            UPDATE rbac_roles
            SET name = $3,
                description = $4,
                updated_at = now()
            WHERE tenant_id = $1
                AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role.id.as_uuid())
        .bind(role.name.as_str())
        .bind(role.description.as_deref())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_name_conflict(error, role.name.as_str()))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "role '{}' was not found",
                role.id
            )));
        }

        sqlx::query(
            r#"
            DELETE FROM rbac_role_permissions
            WHERE role_id = $1
            "#,
        )
        .bind(role.id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to clear role grants: {error}")))?;

        replace_role_grants(&mut transaction, role.id, &role.permission_ids).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn delete_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        // Re-checked inside the transaction; the RESTRICT foreign key on
        // principals.custom_role_id is the last line of defense.
        let bound = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM principals
            WHERE tenant_id = $1
                AND custom_role_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count role bindings: {error}")))?;

        if bound > 0 {
            return Err(AppError::Conflict(format!(
                "role '{role_id}' is assigned to {bound} member(s)"
            )));
        }

        let rows_affected = sqlx::query(
            r#"
            DELETE FROM rbac_roles
            WHERE tenant_id = $1
                AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_binding_restriction(error, role_id))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' was not found"
            )));
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn count_roles_referencing_permission(
        &self,
        permission_id: PermissionId,
    ) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM rbac_role_permissions
            WHERE permission_id = $1
            "#,
        )
        .bind(permission_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count permission references: {error}"))
        })?;

        Ok(count.unsigned_abs())
    }
}

async fn replace_role_grants(
    transaction: &mut Transaction<'_, Postgres>,
    role_id: RoleId,
    permission_ids: &BTreeSet<PermissionId>,
) -> AppResult<()> {
    for permission_id in permission_ids {
        sqlx::query(
            r#"
            INSERT INTO rbac_role_permissions (role_id, permission_id)
            VALUES ($1, $2)
            ON CONFLICT (role_id, permission_id) DO NOTHING
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(permission_id.as_uuid())
        .execute(&mut **transaction)
        .await
        .map_err(|error| map_unknown_permission(error, *permission_id))?;
    }

    Ok(())
}

fn aggregate_roles(rows: Vec<RoleRow>) -> AppResult<Vec<Role>> {
    struct PartialRole {
        name: String,
        description: Option<String>,
        permission_ids: BTreeSet<PermissionId>,
    }

    let mut by_id: HashMap<uuid::Uuid, PartialRole> = HashMap::new();
    for row in rows {
        let partial = by_id.entry(row.role_id).or_insert_with(|| PartialRole {
            name: row.role_name,
            description: row.description,
            permission_ids: BTreeSet::new(),
        });

        if let Some(permission_id) = row.permission_id {
            partial
                .permission_ids
                .insert(PermissionId::from_uuid(permission_id));
        }
    }

    let mut roles = Vec::with_capacity(by_id.len());
    for (role_id, partial) in by_id {
        roles.push(
            Role::new(
                RoleId::from_uuid(role_id),
                partial.name,
                partial.description,
                partial.permission_ids,
            )
            .map_err(|error| {
                AppError::Internal(format!("invalid stored role '{role_id}': {error}"))
            })?,
        );
    }

    roles.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(roles)
}

fn map_name_conflict(error: sqlx::Error, role_name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!(
            "role '{role_name}' already exists in this tenant"
        ));
    }

    AppError::Internal(format!("failed to persist role: {error}"))
}

fn map_unknown_permission(error: sqlx::Error, permission_id: PermissionId) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23503")
    {
        return AppError::NotFound(format!("permission '{permission_id}' was not found"));
    }

    AppError::Internal(format!("failed to persist role grants: {error}"))
}

fn map_binding_restriction(error: sqlx::Error, role_id: RoleId) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23503")
    {
        return AppError::Conflict(format!("role '{role_id}' is still assigned to members"));
    }

    AppError::Internal(format!("failed to delete role: {error}"))
}

#[cfg(test)]
mod tests;
