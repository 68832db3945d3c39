//! Resource server: loads resource definitions from a JSON file, connects to PostgreSQL,
//! mounts common and resource routes.

use axum::Router;
use pg_resource::{
    common_routes_with_ready, load_from_file, resolve, resource_routes, AppState, PgStorage,
    ResourceRegistry, Settings, Storage,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pg_resource=info")),
        )
        .init();

    let settings = Arc::new(Settings::from_env()?);
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/resources".into());
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    let storage: Arc<dyn Storage> = Arc::new(PgStorage::new(pool));

    let resources_path = std::env::var("RESOURCES_PATH").unwrap_or_else(|_| "resources.json".into());
    let configs = load_from_file(&resources_path).await?;
    let registry = ResourceRegistry::build(resolve(&configs)?, settings.clone(), storage.clone())?;
    tracing::info!(count = registry.len(), base_url = %settings.base_url, "resources loaded");

    let state = AppState::new(storage, registry);
    let app = Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .merge(resource_routes(state));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
