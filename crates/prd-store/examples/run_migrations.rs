//! Apply database migrations against `DATABASE_URL`.
//!
//! Usage: `cargo run --example run_migrations`

use prd_config::DatabaseConfig;
use prd_store::pool::initialize_database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DatabaseConfig::from_env();
    let pool = initialize_database(&config).await?;

    let tables: Vec<String> = sqlx::query_scalar(
        "select table_name from information_schema.tables
         where table_schema = 'public'
         order by table_name",
    )
    .fetch_all(&pool)
    .await?;

    println!("Applied migrations. Tables present:");
    for table in tables {
        println!("  - {table}");
    }

    Ok(())
}
