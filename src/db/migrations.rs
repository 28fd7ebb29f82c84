//! Database migrations
//!
//! Migrations are embedded in the binary as SQL strings, one variant per
//! backend, and applied in version order at startup. Applied versions are
//! recorded in the `_migrations` table so each runs once.

use anyhow::{Context, Result};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// All migrations, in the order they are applied.
///
/// `want_to_go_list` holds a JSON array of destination names and stays NULL
/// until the first destination is saved.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(255) NOT NULL UNIQUE,
                password VARCHAR(255) NOT NULL,
                want_to_go_list TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                username VARCHAR(255) NOT NULL UNIQUE,
                password VARCHAR(255) NOT NULL,
                want_to_go_list LONGTEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_sessions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                username VARCHAR(255) NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (username) REFERENCES users(username) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                username VARCHAR(255) NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (username) REFERENCES users(username) ON DELETE CASCADE
            );
            CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);
        "#,
    },
];

/// Run all pending migrations.
///
/// Returns the number of migrations applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = applied_versions(pool).await?;
    let mut count = 0;

    for migration in MIGRATIONS {
        if applied.contains(&migration.version) {
            continue;
        }
        tracing::info!("Applying migration {}: {}", migration.version, migration.name);
        apply_migration(pool, migration)
            .await
            .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
        count += 1;
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

async fn applied_versions(pool: &DynDatabasePool) -> Result<Vec<i32>> {
    const SQL: &str = "SELECT version FROM _migrations ORDER BY version";

    let versions = match pool.driver() {
        DatabaseDriver::Sqlite => sqlx::query(SQL)
            .fetch_all(pool.sqlite()?)
            .await?
            .iter()
            .map(|row| row.get::<i64, _>("version") as i32)
            .collect(),
        DatabaseDriver::Mysql => sqlx::query(SQL)
            .fetch_all(pool.mysql()?)
            .await?
            .iter()
            .map(|row| row.get::<i32, _>("version"))
            .collect(),
    };

    Ok(versions)
}

async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => apply_migration_sqlite(pool.sqlite()?, migration).await,
        DatabaseDriver::Mysql => apply_migration_mysql(pool.mysql()?, migration).await,
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_sqlite) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_mysql) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split a migration into trimmed, non-empty statements.
///
/// Migrations never contain `;` inside string literals, so a plain split is
/// enough. Fragments made only of `--` comments are dropped.
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}
