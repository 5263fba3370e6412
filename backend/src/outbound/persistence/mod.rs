//! PostgreSQL persistence adapters.
//!
//! Repository implementations only translate between Diesel rows and domain
//! types; validation and business rules stay in the domain services. Row
//! structs and the schema are internal and never exposed upward.

mod diesel_history_repository;
mod diesel_vaccine_repository;
mod error_mapping;
mod models;
mod pool;
mod schema;

use diesel::Connection;
use diesel_async::AsyncPgConnection;
use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

pub use diesel_history_repository::DieselHistoryRepository;
pub use diesel_vaccine_repository::DieselVaccineRepository;
pub use pool::{DbPool, PoolConfig, PoolError};

/// Embedded migrations from the backend/migrations directory.
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Errors raised while applying schema migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Could not establish the migration connection.
    #[error("failed to connect for migrations: {0}")]
    Connection(#[from] diesel::ConnectionError),
    /// A migration failed to apply.
    #[error("failed to run migrations: {0}")]
    Migration(String),
    /// The blocking migration task panicked or was cancelled.
    #[error("migration task failed: {0}")]
    Task(String),
}

/// Apply pending migrations against the given database.
///
/// Migrations run on a blocking thread through a synchronous wrapper around
/// the async connection, since the migration harness is synchronous.
pub async fn run_migrations(database_url: &str) -> Result<(), MigrationError> {
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || {
        let mut conn: AsyncConnectionWrapper<AsyncPgConnection> =
            AsyncConnectionWrapper::establish(&url)?;
        conn.run_pending_migrations(MIGRATIONS)
            .map(|versions| versions.len())
            .map_err(|e| MigrationError::Migration(e.to_string()))
    })
    .await
    .map_err(|e| MigrationError::Task(e.to_string()))??;
    info!(applied, "database migrations applied");
    Ok(())
}
