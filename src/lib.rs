// Library exports for the PetsQRCode backend
// The binary and the integration tests build the router through here

pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod services;
pub mod stores;
pub mod utils;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, CONFIG};
pub use db::{DieselDatabaseConfig, DieselPool};
pub use middleware::{auth_middleware, cors_middleware, AuthenticatedUser};
pub use services::{
    EmailService, GoTrueClient, JwtConfig, JwtService, SupabaseStorage,
};
pub use utils::service_error::ServiceError;

/// Build shared state from configuration. The pool is checked once so startup
/// fails fast when the database is unreachable.
pub async fn initialize_app_state(config: &AppConfig) -> Result<AppState, Box<dyn std::error::Error>> {
    info!("Initializing database pool...");
    let db_config = DieselDatabaseConfig::from_app_config(config);
    let max_connections = db_config.max_connections;
    let diesel_pool = db::create_diesel_pool(db_config).await?;

    let email_service = EmailService::new(config.email.clone())?;

    Ok(AppState {
        config: Arc::new(config.clone()),
        diesel_pool,
        jwt_service: Arc::new(JwtService::from_auth_config(&config.auth)),
        auth_provider: Arc::new(GoTrueClient::new(&config.auth)),
        storage: Arc::new(SupabaseStorage::new(&config.storage)),
        email_service: Arc::new(email_service),
        max_connections,
    })
}

/// Full application router: public routes, session-protected `/api` and
/// `/account` trees, request tracing and CORS.
pub fn build_router(state: AppState) -> Router {
    let api = handlers::api_routes()
        .route_layer(from_fn_with_state(state.clone(), auth_middleware))
        .merge(handlers::public_api_routes());
    let account = handlers::account_routes()
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .nest("/account", account)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(state.clone(), cors_middleware))
        .with_state(state)
}

/// Service health with the database component status
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "healthCheck",
    responses(
        (status = 200, description = "All components healthy"),
        (status = 503, description = "Database unreachable")
    )
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = chrono::Utc::now().to_rfc3339();

    let (healthy, postgres_health) = match db::check_diesel_health(&state.diesel_pool).await {
        Ok(()) => (
            true,
            serde_json::json!({
                "status": "healthy",
                "max_connections": state.max_connections,
                "error": null
            }),
        ),
        Err(e) => (
            false,
            serde_json::json!({
                "status": "unhealthy",
                "error": format!("Database connection failed: {}", e)
            }),
        ),
    };

    let response = serde_json::json!({
        "status": if healthy { "healthy" } else { "degraded" },
        "service": "petsqr-backend",
        "timestamp": timestamp,
        "components": {
            "postgresql": postgres_health
        }
    });

    if healthy {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}
