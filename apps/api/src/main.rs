//! Tessera API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dev_seed;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::path::Path;

use tessera_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, GrantStoreConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let app_state = match &config.grant_store {
        GrantStoreConfig::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = api_services::connect_and_migrate(database_url, *max_connections).await?;
            if config.migrate_only {
                info!("migrations applied successfully");
                return Ok(());
            }

            api_services::build_postgres_state(pool)
        }
        GrantStoreConfig::Memory { seed_file } => {
            info!(%seed_file, "using in-memory stores; grants are lost on restart");
            let seed = dev_seed::MemorySeed::load(Path::new(seed_file))?;
            dev_seed::seed_memory_state(&seed).await?
        }
    };

    let app = api_router::build_router(app_state, config.frontend_url.as_deref())?;
    let address = config.socket_address()?;

    info!(%address, "tessera api listening");

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind api listener: {error}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
