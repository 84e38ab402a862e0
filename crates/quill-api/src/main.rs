//! Quill API Server
//!
//! Authentication server for the Quill blog backend.
//!
//! Author: hephaex@gmail.com

use anyhow::Context;
use quill_api::{create_router, state::AppState};
use quill_core::config::{AppConfig, LoggingConfig};
use quill_core::{InMemoryUserStore, PgUserStore, UserStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "quill_api={level},quill_core={level},audit=info,tower_http=debug",
            level = logging.level
        )
        .into()
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn connect_store(config: &AppConfig) -> anyhow::Result<Arc<dyn UserStore>> {
    match &config.database.url {
        Some(url) => {
            let store = PgUserStore::new(url, config.database.max_connections)
                .await
                .context("Failed to connect to PostgreSQL")?;
            store
                .migrate()
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Using PostgreSQL user store");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, users are kept in memory only");
            Ok(Arc::new(InMemoryUserStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    // Missing secrets are fatal
    let config = AppConfig::load().context("Invalid configuration")?;
    init_tracing(&config.logging);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let prefix = config.server.api_prefix.clone();

    let users = connect_store(&config).await?;
    let state = Arc::new(AppState::new(config, users));

    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Quill API Server starting on http://{}", addr);
    tracing::info!("Auth endpoints under http://{}/{}/auth", addr, prefix);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
