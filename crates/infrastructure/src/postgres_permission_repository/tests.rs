use std::collections::BTreeSet;

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use huntboard_application::{PermissionRepository, RoleRepository};
use huntboard_core::{AppError, TenantId};
use huntboard_domain::{Permission, PermissionId, PermissionKey, Role, RoleId};

use crate::PostgresRoleRepository;

use super::PostgresPermissionRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres permission tests: {error}");
    }

    Some(pool)
}

async fn ensure_tenant(pool: &PgPool, tenant_id: TenantId, name: &str) {
    let insert = sqlx::query(
        r#"
            INSERT INTO tenants (id, name)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
    )
    .bind(tenant_id.as_uuid())
    .bind(name)
    .execute(pool)
    .await;

    assert!(insert.is_ok());
}

fn permission_fixture() -> Permission {
    let key = PermissionKey::new(format!("test:{}", uuid::Uuid::new_v4().simple()))
        .unwrap_or_else(|_| panic!("fixture key"));
    Permission::new(PermissionId::new(), key, "Fixture Permission", None, None)
        .unwrap_or_else(|_| panic!("fixture permission"))
}

#[tokio::test]
async fn permission_round_trip_and_duplicate_key_conflict() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresPermissionRepository::new(pool);
    let permission = permission_fixture();
    let permission_id = permission.id;
    let key = permission.key.clone();

    let inserted = repository.insert_permission(permission.clone()).await;
    assert!(inserted.is_ok());

    let loaded = repository.find_permission(permission_id).await;
    assert_eq!(loaded.ok().flatten().map(|p| p.key), Some(key.clone()));

    let by_key = repository.find_permission_by_key(&key).await;
    assert_eq!(by_key.ok().flatten().map(|p| p.id), Some(permission_id));

    let duplicate = Permission::new(PermissionId::new(), key, "Duplicate", None, None)
        .unwrap_or_else(|_| panic!("fixture permission"));
    let conflict = repository.insert_permission(duplicate).await;
    assert!(matches!(conflict, Err(AppError::Conflict(_))));

    assert!(repository.delete_permission(permission_id).await.is_ok());
    assert!(matches!(
        repository.delete_permission(permission_id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn referenced_permission_cannot_be_deleted() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let permissions = PostgresPermissionRepository::new(pool.clone());
    let roles = PostgresRoleRepository::new(pool.clone());
    let tenant_id = TenantId::new();
    ensure_tenant(&pool, tenant_id, "Permission Reference Tenant").await;

    let permission = permission_fixture();
    let permission_id = permission.id;
    assert!(permissions.insert_permission(permission).await.is_ok());

    let role = Role::new(
        RoleId::new(),
        format!("Reference Holder {}", uuid::Uuid::new_v4().simple()),
        None,
        BTreeSet::from([permission_id]),
    )
    .unwrap_or_else(|_| panic!("fixture role"));
    let role_id = role.id;
    assert!(roles.insert_role(tenant_id, role).await.is_ok());

    let blocked = permissions.delete_permission(permission_id).await;
    assert!(matches!(blocked, Err(AppError::Conflict(_))));

    assert!(roles.delete_role(tenant_id, role_id).await.is_ok());
    assert!(permissions.delete_permission(permission_id).await.is_ok());
}
