use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blitz::{
    auth::{
        repository::{InMemoryAccountRepository, PostgresAccountRepository},
        TokenConfig,
    },
    build_router,
    models::TABLES,
    store::{InMemoryStore, PostgresStore},
    AppConfig, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blitz=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Blitz API server");

    let config = AppConfig::from_env().context("invalid configuration")?;
    if config.uses_development_secret() {
        warn!("JWT_SECRET not set, signing tokens with the development key");
    }
    let token_config = TokenConfig::from_config(&config);

    let app_state = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await
                .context("failed to connect to database")?;

            // Accounts first: profiles reference them
            let accounts = PostgresAccountRepository::new(pool.clone());
            accounts.migrate().await?;
            let store = PostgresStore::new(pool);
            store.migrate(TABLES).await?;

            info!("Using PostgreSQL storage");
            AppState::new(Arc::new(store), Arc::new(accounts), token_config)
        }
        None => {
            warn!("DATABASE_URL not set, data is kept in memory and lost on restart");
            AppState::new(
                Arc::new(InMemoryStore::new()),
                Arc::new(InMemoryAccountRepository::new()),
                token_config,
            )
        }
    };

    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
