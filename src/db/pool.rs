//! Database connection pool abstraction
//!
//! A unified interface over the SQLite and MySQL pools. The pool is created
//! from the configuration and repositories dispatch on [`DatabasePool::driver`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    mysql::{MySqlPool, MySqlPoolOptions},
    sqlite::{SqlitePool, SqlitePoolOptions},
};
use std::path::Path;
use std::sync::Arc;

use crate::config::{DatabaseConfig, DatabaseDriver};

/// Backend-independent handle to the user store.
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Execute a raw SQL statement that doesn't return rows
    async fn execute(&self, query: &str) -> Result<u64>;

    /// Check if the database connection is healthy
    async fn ping(&self) -> Result<()>;

    /// Close the connection pool
    async fn close(&self);

    /// Get the database driver type
    fn driver(&self) -> DatabaseDriver;

    /// Get the underlying SQLite pool if this is a SQLite connection
    fn as_sqlite(&self) -> Option<&SqlitePool>;

    /// Get the underlying MySQL pool if this is a MySQL connection
    fn as_mysql(&self) -> Option<&MySqlPool>;

    /// The SQLite pool, or an error when connected to another backend
    fn sqlite(&self) -> Result<&SqlitePool> {
        self.as_sqlite()
            .with_context(|| format!("Expected a SQLite pool, driver is {:?}", self.driver()))
    }

    /// The MySQL pool, or an error when connected to another backend
    fn mysql(&self) -> Result<&MySqlPool> {
        self.as_mysql()
            .with_context(|| format!("Expected a MySQL pool, driver is {:?}", self.driver()))
    }
}

/// Type alias for a shared database pool
pub type DynDatabasePool = Arc<dyn DatabasePool>;

/// SQLite connection pool
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open (creating if needed) a SQLite database.
    ///
    /// Accepts `:memory:`, a `sqlite:` URL or a bare file path. Parent
    /// directories of a file path are created.
    pub async fn new(url: &str) -> Result<Self> {
        if let Some(path) = sqlite_file_path(url) {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create database directory: {:?}", parent)
                    })?;
                }
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(20)
            .connect(&sqlite_connection_url(url))
            .await
            .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .context("Failed to enable foreign keys")?;

        Ok(Self { pool })
    }
}

/// File path behind a SQLite URL, `None` for in-memory databases
fn sqlite_file_path(url: &str) -> Option<&str> {
    if url == ":memory:" || url.starts_with("sqlite::memory:") {
        return None;
    }
    let path = url.strip_prefix("sqlite:").unwrap_or(url);
    Some(path.split('?').next().unwrap_or(path))
}

/// Normalise the configured URL into one sqlx accepts, opening files in
/// read-write-create mode unless options were given explicitly.
fn sqlite_connection_url(url: &str) -> String {
    if url == ":memory:" {
        "sqlite::memory:".to_string()
    } else if url.starts_with("sqlite:") {
        if url.contains('?') {
            url.to_string()
        } else {
            format!("{}?mode=rwc", url)
        }
    } else {
        format!("sqlite:{}?mode=rwc", url)
    }
}

#[async_trait]
impl DatabasePool for SqliteDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute query: {}", query))?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Sqlite
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        Some(&self.pool)
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        None
    }
}

/// MySQL connection pool
pub struct MysqlDatabase {
    pool: MySqlPool,
}

impl MysqlDatabase {
    /// Connect to a MySQL server; the `mysql://` scheme is optional.
    pub async fn new(url: &str) -> Result<Self> {
        let connection_url = if url.starts_with("mysql://") {
            url.to_string()
        } else {
            format!("mysql://{}", url)
        };

        let pool = MySqlPoolOptions::new()
            .max_connections(30)
            .connect(&connection_url)
            .await
            .with_context(|| format!("Failed to connect to MySQL database: {}", url))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabasePool for MysqlDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute query: {}", query))?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Mysql
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        None
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        Some(&self.pool)
    }
}

/// Create a database connection pool based on configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established. Startup treats
/// this as fatal.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    match config.driver {
        DatabaseDriver::Sqlite => Ok(Arc::new(SqliteDatabase::new(&config.url).await?)),
        DatabaseDriver::Mysql => Ok(Arc::new(MysqlDatabase::new(&config.url).await?)),
    }
}

/// Create a SQLite in-memory database pool for tests
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    let config = DatabaseConfig {
        driver: DatabaseDriver::Sqlite,
        url: ":memory:".to_string(),
    };
    create_pool(&config).await
}
