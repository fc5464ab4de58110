use anyhow::Result;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use simuhub_storefront::{
    consumers,
    platform::{app_state::AppState, bootstrap, config::AppConfig, db},
};

/// Migrations embedded into the binary which helps with streamlining image building process
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing();
    bootstrap::init_env();

    let config = AppConfig::load()?;

    tracing::info!("Running migrations...");
    let migrations_count = db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    if config.sms.api_key.is_none() {
        tracing::warn!("SMS API key is not configured, notifications will be logged as failed");
    }

    tracing::info!("Bootstrapping...");
    let db_pool = db::create_pool(&config.database.url, config.database.max_connections).await?;
    let state = AppState::new(config, db_pool);

    let relay = consumers::notifications::spawn_relay(
        state.outbox.clone(),
        state.gateway.clone(),
        state.config.relay.clone(),
    );

    let server = state.config.server.clone();
    let result = bootstrap::serve(simuhub_storefront::app(state), &server).await;
    relay.abort();
    result
}
