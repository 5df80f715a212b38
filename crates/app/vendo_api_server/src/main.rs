//! Vendo API server binary.

use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use vendo_api::config::ApiConfig;
use vendo_core::auth::password::PasswordPolicy;
use vendo_core::auth::session::SessionManager;
use vendo_core::auth::store::PgSessionStore;
use vendo_core::auth::tokens::{TokenConfig, resolve_secret};
use vendo_core::auth::users::PgUserStore;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "vendo_api_server", about = "Vendo API server")]
struct Args {
    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/vendo"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vendo_api=debug,vendo_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    info!(port = args.port, "starting vendo_api_server");

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&args.database_url)
        .await?;

    info!("running database migrations");
    vendo_api::migrate(&pool).await?;

    let config = ApiConfig {
        bind_addr: format!("127.0.0.1:{}", args.port),
        database_url: args.database_url.clone(),
        access_secret: resolve_secret("ACCESS_TOKEN_SECRET", "access-secret"),
        refresh_secret: resolve_secret("REFRESH_TOKEN_SECRET", "refresh-secret"),
        password_policy: PasswordPolicy::default(),
    };

    let session_store = Arc::new(PgSessionStore::new(pool.clone()));

    // One-shot cleanup of entries that lapsed while the server was down.
    let purged = session_store.purge_expired().await?;
    if purged > 0 {
        info!(purged, "purged expired session entries");
    }

    let sessions = SessionManager::new(
        TokenConfig::new(config.access_secret.clone(), config.refresh_secret.clone()),
        session_store,
    );

    let state = vendo_api::AppState {
        users: Arc::new(PgUserStore::new(pool)),
        sessions,
        config: config.clone(),
    };

    let app = vendo_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app).await?;

    Ok(())
}
