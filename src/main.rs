use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, app, cors_layer};
use multicare_core::config::token_ttl_from_env_value;
use multicare_core::{CoreConfig, DEFAULT_DATABASE_PATH, DEFAULT_UPLOAD_DIR, Store};

/// Main entry point for the Multicare backend
///
/// Resolves configuration once, opens (and migrates) the store, then serves the REST API with
/// OpenAPI/Swagger documentation.
///
/// # Environment Variables
/// - `MULTICARE_REST_ADDR`: REST server address (default: "0.0.0.0:8000")
/// - `DATABASE_PATH`: SQLite database file (default: "multicare.db")
/// - `UPLOAD_DIR`: Root directory for uploaded documents (default: "uploads")
/// - `TOKEN_TTL_MINUTES`: Bearer token lifetime (default: 30)
/// - `CORS_ALLOWED_ORIGINS`: Comma-separated origins; unset allows any origin
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the store cannot be opened, or
/// - the server address cannot be bound.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("multicare=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("MULTICARE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());
    let database_path = std::env::var("DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATABASE_PATH));
    let upload_dir = std::env::var("UPLOAD_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_UPLOAD_DIR));
    let token_ttl = token_ttl_from_env_value(std::env::var("TOKEN_TTL_MINUTES").ok())?;
    let cors_origins = std::env::var("CORS_ALLOWED_ORIGINS").ok();

    let cfg = CoreConfig::new(database_path, upload_dir, token_ttl)?;
    cfg.prepare_upload_dir()?;
    let store = Store::open(cfg.database_path())?;

    tracing::info!(
        database = %cfg.database_path().display(),
        uploads = %cfg.upload_dir().display(),
        "++ Store ready"
    );
    tracing::info!("++ Starting Multicare REST on {}", rest_addr);

    let state = AppState::new(Arc::new(cfg), store);
    let rest_app = app(state, cors_layer(cors_origins.as_deref()));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, rest_app).await?;

    Ok(())
}
