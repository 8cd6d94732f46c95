use std::time::Duration;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// An exhausted pool fails the acquiring request fast instead of queueing it
/// behind an oracle call that may take most of its own 120s budget.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates the PostgreSQL connection pool backing the interview records.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    info!(max_connections, "Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}
