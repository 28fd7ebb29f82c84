//! Session repository
//!
//! Database operations for login sessions:
//! - `SessionRepository` trait defining the interface for session data access
//! - `SqlxSessionRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new session
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get session by ID (cookie value)
    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Delete a session
    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete expired sessions, returning how many were removed
    async fn delete_expired(&self) -> Result<u64>;
}

/// SQLx-based session repository implementation
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    /// Create a new SQLx session repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_session_sqlite(self.pool.sqlite()?, session).await,
            DatabaseDriver::Mysql => create_session_mysql(self.pool.mysql()?, session).await,
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_session_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_session_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let sql = "DELETE FROM sessions WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .execute(self.pool.sqlite()?)
                .await
                .map(|_| ()),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .execute(self.pool.mysql()?)
                .await
                .map(|_| ()),
        }
        .context("Failed to delete session")?;

        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64> {
        let sql = "DELETE FROM sessions WHERE expires_at < ?";
        let now = Utc::now();
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(now)
                .execute(self.pool.sqlite()?)
                .await
                .map(|r| r.rows_affected()),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(now)
                .execute(self.pool.mysql()?)
                .await
                .map(|r| r.rows_affected()),
        }
        .context("Failed to delete expired sessions")?;

        Ok(affected)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_session_sqlite(pool: &SqlitePool, session: &Session) -> Result<Session> {
    sqlx::query(
        r#"
        INSERT INTO sessions (id, username, expires_at, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(&session.username)
    .bind(session.expires_at)
    .bind(session.created_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(session.clone())
}

async fn get_session_by_id_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT id, username, expires_at, created_at
        FROM sessions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get session by ID")?;

    Ok(row.map(|row| Session {
        id: row.get("id"),
        username: row.get("username"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }))
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_session_mysql(pool: &MySqlPool, session: &Session) -> Result<Session> {
    sqlx::query(
        r#"
        INSERT INTO sessions (id, username, expires_at, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(&session.username)
    .bind(session.expires_at)
    .bind(session.created_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(session.clone())
}

async fn get_session_by_id_mysql(pool: &MySqlPool, id: &str) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT id, username, expires_at, created_at
        FROM sessions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get session by ID")?;

    Ok(row.map(|row| Session {
        id: row.get("id"),
        username: row.get("username"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }))
}
