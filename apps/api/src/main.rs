//! Huntboard registry API composition root.

#![forbid(unsafe_code)]

mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, patch};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use huntboard_application::{
    AuthorizationService, BindingService, PermissionRegistryService, PrincipalRepository,
    RoleRepository, RoleService,
};
use huntboard_core::AppError;
use huntboard_infrastructure::{
    PostgresAuditRepository, PostgresAuthorizationRepository, PostgresDefaultPermissionProvider,
    PostgresPermissionRepository, PostgresPrincipalRepository, PostgresRoleRepository,
};

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let database_url = required_env("DATABASE_URL")?;
    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);

    let max_bulk_batch = env::var("MAX_BULK_BATCH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(|value| {
            value
                .parse::<usize>()
                .map_err(|error| AppError::Validation(format!("invalid MAX_BULK_BATCH: {error}")))
        })
        .transpose()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let permission_repository = Arc::new(PostgresPermissionRepository::new(pool.clone()));
    let role_repository: Arc<dyn RoleRepository> =
        Arc::new(PostgresRoleRepository::new(pool.clone()));
    let principal_repository: Arc<dyn PrincipalRepository> =
        Arc::new(PostgresPrincipalRepository::new(pool.clone()));
    let authorization_repository = Arc::new(PostgresAuthorizationRepository::new(pool.clone()));
    let default_permission_provider =
        Arc::new(PostgresDefaultPermissionProvider::new(pool.clone()));
    let audit_repository = Arc::new(PostgresAuditRepository::new(pool.clone()));

    let authorization_service =
        AuthorizationService::new(authorization_repository, default_permission_provider);
    let permission_registry_service = PermissionRegistryService::new(
        authorization_service.clone(),
        permission_repository.clone(),
        role_repository.clone(),
        audit_repository.clone(),
    );
    let role_service = RoleService::new(
        authorization_service.clone(),
        role_repository.clone(),
        permission_repository,
        principal_repository.clone(),
        audit_repository.clone(),
    );
    let mut binding_service = BindingService::new(
        authorization_service,
        principal_repository.clone(),
        role_repository.clone(),
        audit_repository,
    );
    if let Some(max_bulk_batch) = max_bulk_batch {
        binding_service = binding_service.with_max_bulk_batch(max_bulk_batch);
    }

    let app_state = AppState {
        permission_registry_service,
        role_service,
        binding_service,
        principal_repository,
        role_repository,
        frontend_url: frontend_url.clone(),
    };

    let protected_routes = Router::new()
        .route(
            "/api/permissions",
            get(handlers::permissions::list_permissions_handler)
                .post(handlers::permissions::create_permission_handler),
        )
        .route(
            "/api/permissions/{permission_id}",
            delete(handlers::permissions::delete_permission_handler),
        )
        .route(
            "/api/roles",
            get(handlers::roles::list_roles_handler).post(handlers::roles::create_role_handler),
        )
        .route(
            "/api/roles/{role_id}",
            patch(handlers::roles::update_role_handler)
                .delete(handlers::roles::delete_role_handler),
        )
        .route(
            "/api/principals",
            get(handlers::principals::list_principals_handler),
        )
        .route(
            "/api/principals/bulk/role",
            patch(handlers::principals::bulk_assign_role_handler),
        )
        .route(
            "/api/principals/bulk/status",
            patch(handlers::principals::bulk_toggle_status_handler),
        )
        .route(
            "/api/principals/{principal_id}/role",
            patch(handlers::principals::assign_role_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::resolve_actor,
        ))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static("x-principal-id")]);

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "huntboard-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
