//! Database layer
//!
//! Persistence for users and sessions. Two backends are supported:
//! - SQLite (default, for single-binary deployment)
//! - MySQL
//!
//! The backend is selected by `database.driver` in the configuration.
//! Everything above this module talks to the repositories in
//! [`repositories`], never to a concrete pool.
//!
//! # Usage
//!
//! ```ignore
//! use wanderlist::config::DatabaseConfig;
//! use wanderlist::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};

/// Whether an error raised by a repository came from a unique index.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map_or(false, |e| e.is_unique_violation())
}
