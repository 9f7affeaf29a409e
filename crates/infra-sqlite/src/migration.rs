// Migration Runner

use crate::error::map_sqlx_error;
use sendq_core::error::Result;
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Ordered schema steps: (version, label, sql)
const MIGRATIONS: &[(i64, &str, &str)] = &[(
    1,
    "state records",
    include_str!("../migrations/001_initial_schema.sql"),
)];

/// Bring the schema up to the latest version. Safe to call on every start.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current = schema_version(pool).await?;
    debug!(schema_version = current, "Checking schema");

    for &(version, label, sql) in MIGRATIONS.iter().filter(|(v, _, _)| *v > current) {
        info!(version = version, label = label, "Applying migration");
        apply_migration(pool, sql).await?;
    }

    Ok(())
}

async fn schema_version(pool: &SqlitePool) -> Result<i64> {
    let has_table: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version')",
    )
    .fetch_one(pool)
    .await
    .map_err(map_sqlx_error)?;

    if !has_table {
        return Ok(0);
    }

    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await
        .map_err(map_sqlx_error)?;
    Ok(version.unwrap_or(0))
}

/// Statements of a migration file, comment lines stripped
fn statements(sql: &str) -> impl Iterator<Item = String> + '_ {
    sql.split(';')
        .map(|chunk| {
            chunk
                .lines()
                .filter(|line| !line.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .map(|stmt| stmt.trim().to_string())
        .filter(|stmt| !stmt.is_empty())
}

/// One migration file, all-or-nothing
async fn apply_migration(pool: &SqlitePool, sql: &str) -> Result<()> {
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;
    for stmt in statements(sql) {
        sqlx::query(&stmt)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
    }
    tx.commit().await.map_err(map_sqlx_error)
}
