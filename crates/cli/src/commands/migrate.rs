//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! petbox-cli migrate
//! ```
//!
//! Applies `crates/storefront/migrations/` and creates the session table
//! used by `tower-sessions`.

use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, connect};

/// Run storefront migrations and the session store migration.
///
/// # Errors
///
/// Returns an error if the connection or any migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Creating session store table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
