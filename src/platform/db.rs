use anyhow::{Context, Result};
use diesel::{Connection, PgConnection};
use diesel_async::{
    AsyncPgConnection,
    pooled_connection::{AsyncDieselConnectionManager, bb8::Pool},
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness};

pub type DbPool = Pool<AsyncPgConnection>;

pub async fn create_pool(url: &str, max_connections: u32) -> Result<DbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(url);
    Pool::builder()
        .max_size(max_connections)
        .build(manager)
        .await
        .context("Failed to build the database pool")
}

/// Builds a pool that only connects on first use.
pub fn lazy_pool(url: &str) -> DbPool {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(url);
    Pool::builder().build_unchecked(manager)
}

/// Runs pending migrations on a blocking thread and returns how many were applied.
pub async fn run_migrations_blocking(migrations: EmbeddedMigrations, url: &str) -> Result<usize> {
    let url = url.to_string();
    tokio::task::spawn_blocking(move || -> Result<usize> {
        let mut conn =
            PgConnection::establish(&url).context("Failed to connect for migrations")?;
        let applied = conn
            .run_pending_migrations(migrations)
            .map_err(|err| anyhow::anyhow!("Failed to run migrations: {err}"))?;
        Ok(applied.len())
    })
    .await
    .context("Migration task panicked")?
}
