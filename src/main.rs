use std::sync::Arc;

use apiary_api::config::AppConfig;
use apiary_api::database::{schema, ApiaryStore, DatabaseManager, MemoryStore, PgStore};
use apiary_api::{app, init_tracing, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();
    init_tracing();

    // Initialize configuration (this loads the config singleton)
    let config: AppConfig = apiary_api::config::config().clone();
    config.ensure_deployable()?;
    tracing::info!("Starting Apiary API in {:?} mode", config.environment);

    let store: Arc<dyn ApiaryStore> = match &config.database.url {
        Some(_) => {
            let pool = DatabaseManager::connect(&config.database).await?;
            schema::apply(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set; records are kept in memory and lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let router = app(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Apiary API listening on http://{}", bind_addr);

    axum::serve(listener, router).await?;
    Ok(())
}
