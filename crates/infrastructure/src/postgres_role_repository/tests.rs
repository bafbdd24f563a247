use std::collections::BTreeSet;

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use huntboard_application::{PermissionRepository, RoleRepository};
use huntboard_core::{AppError, TenantId};
use huntboard_domain::{Permission, PermissionId, PermissionKey, Role, RoleId};

use crate::PostgresPermissionRepository;

use super::PostgresRoleRepository;

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
        panic!("failed to run migrations for postgres role tests: {error}");
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

async fn seed_permission(pool: &PgPool) -> PermissionId {
    let key = PermissionKey::new(format!("test:{}", uuid::Uuid::new_v4().simple()))
        .unwrap_or_else(|_| panic!("fixture key"));
    let permission = Permission::new(PermissionId::new(), key, "Fixture Permission", None, None)
        .unwrap_or_else(|_| panic!("fixture permission"));
    let permission_id = permission.id;

    let repository = PostgresPermissionRepository::new(pool.clone());
    assert!(repository.insert_permission(permission).await.is_ok());

    permission_id
}

fn role_fixture(name: &str, permission_ids: BTreeSet<PermissionId>) -> Role {
    Role::new(RoleId::new(), name, Some("fixture".to_owned()), permission_ids)
        .unwrap_or_else(|_| panic!("fixture role"))
}

#[tokio::test]
async fn role_round_trip_preserves_grant_set() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRoleRepository::new(pool.clone());
    let tenant_id = TenantId::new();
    ensure_tenant(&pool, tenant_id, "Role Round Trip Tenant").await;

    let first_permission = seed_permission(&pool).await;
    let second_permission = seed_permission(&pool).await;
    let role = role_fixture(
        "Triage Lead",
        BTreeSet::from([first_permission, second_permission]),
    );
    let role_id = role.id;

    assert!(repository.insert_role(tenant_id, role).await.is_ok());

    let loaded = repository.find_role(tenant_id, role_id).await;
    assert_eq!(
        loaded.ok().flatten().map(|role| role.permission_ids),
        Some(BTreeSet::from([first_permission, second_permission]))
    );

    let listed = repository.list_roles(tenant_id).await;
    assert_eq!(listed.ok().map(|roles| roles.len()), Some(1));
}

#[tokio::test]
async fn duplicate_role_name_in_tenant_is_a_conflict() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRoleRepository::new(pool.clone());
    let tenant_id = TenantId::new();
    ensure_tenant(&pool, tenant_id, "Role Name Tenant").await;
    let permission_id = seed_permission(&pool).await;

    let first = repository
        .insert_role(
            tenant_id,
            role_fixture("Program Manager", BTreeSet::from([permission_id])),
        )
        .await;
    assert!(first.is_ok());

    let duplicate = repository
        .insert_role(
            tenant_id,
            role_fixture("PROGRAM MANAGER", BTreeSet::from([permission_id])),
        )
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let other_tenant = TenantId::new();
    ensure_tenant(&pool, other_tenant, "Second Role Name Tenant").await;
    let same_name_elsewhere = repository
        .insert_role(
            other_tenant,
            role_fixture("Program Manager", BTreeSet::from([permission_id])),
        )
        .await;
    assert!(same_name_elsewhere.is_ok());
}

#[tokio::test]
async fn update_replaces_the_grant_set() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRoleRepository::new(pool.clone());
    let tenant_id = TenantId::new();
    ensure_tenant(&pool, tenant_id, "Role Update Tenant").await;

    let first_permission = seed_permission(&pool).await;
    let second_permission = seed_permission(&pool).await;
    let role = role_fixture("Analyst", BTreeSet::from([first_permission]));
    let role_id = role.id;
    assert!(repository.insert_role(tenant_id, role).await.is_ok());

    let updated = role_fixture("Senior Analyst", BTreeSet::from([second_permission]));
    let updated = Role {
        id: role_id,
        ..updated
    };
    assert!(repository.update_role(tenant_id, updated).await.is_ok());

    let loaded = repository.find_role(tenant_id, role_id).await;
    let loaded = loaded.ok().flatten();
    assert_eq!(
        loaded.as_ref().map(|role| role.name.as_str()),
        Some("Senior Analyst")
    );
    assert_eq!(
        loaded.map(|role| role.permission_ids),
        Some(BTreeSet::from([second_permission]))
    );
}

#[tokio::test]
async fn role_tenant_lookup_spans_tenants() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRoleRepository::new(pool.clone());
    let tenant_id = TenantId::new();
    ensure_tenant(&pool, tenant_id, "Role Tenant Lookup Tenant").await;
    let permission_id = seed_permission(&pool).await;

    let role = role_fixture("Scoped Role", BTreeSet::from([permission_id]));
    let role_id = role.id;
    assert!(repository.insert_role(tenant_id, role).await.is_ok());

    let owner = repository.find_role_tenant(role_id).await;
    assert_eq!(owner.ok().flatten(), Some(tenant_id));

    let missing = repository.find_role_tenant(RoleId::new()).await;
    assert_eq!(missing.ok().flatten(), None);
}
