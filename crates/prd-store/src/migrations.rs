//! Schema migrations, run once at startup (§4.1 composition root).

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::sleep;

/// Apply any pending migrations under `migrations/`.
///
/// # Errors
/// Returns an error if a migration fails to apply or the advisory lock
/// cannot be acquired.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("failed to apply database migrations")
}

/// Poll until migrations have been applied by another process, or `timeout`
/// elapses. Used by workers that start before the primary migration runner.
///
/// # Errors
/// Returns an error if the expected tables are still missing once `timeout`
/// has elapsed.
pub async fn wait_for_migrations(pool: &PgPool, timeout: Duration) -> Result<()> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let exists: bool = sqlx::query_scalar(
            "select exists (select 1 from information_schema.tables where table_name = 'prd_requests')",
        )
        .fetch_one(pool)
        .await
        .context("failed to check migration state")?;
        if exists {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            anyhow::bail!("timed out waiting for database migrations to complete");
        }
        sleep(Duration::from_millis(200)).await;
    }
}
