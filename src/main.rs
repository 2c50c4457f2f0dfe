use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use petsqr_backend::{
    app_config::config, build_router, db::mask_connection_string, initialize_app_state,
    migrations,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables before the configuration is first read
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "petsqr_backend=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config();
    let bind_address = config.server.bind_address.clone();
    info!(
        "Starting PetsQRCode backend ({}) on {}",
        config.environment, bind_address
    );
    info!("Database URL: {}", mask_connection_string(&config.database.url));

    if migrations::should_run_migrations(config) {
        info!("Running embedded migrations...");
        let migration_config = migrations::MigrationConfig::from_app_config(config);
        if let Err(e) = migrations::run_all_migrations(migration_config).await {
            error!("Migration failed: {}", e);
            return Err(format!("Migration failed: {}", e).into());
        }
    }

    let state = match initialize_app_state(config).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            return Err(e);
        },
    };

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on {}", bind_address);
    axum::serve(listener, app).await?;

    Ok(())
}
