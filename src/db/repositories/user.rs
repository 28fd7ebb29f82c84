//! User repository
//!
//! Database operations for users:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL
//!
//! The want-to-go list lives in the `want_to_go_list` column as a JSON array
//! of strings. Appending is a single conditional `UPDATE`, so a name is never
//! stored twice even when two requests race.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user. Fails if the username is taken.
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Append `destination` to the user's want-to-go list unless it is
    /// already there.
    ///
    /// Returns `false` when nothing was written, either because the name is
    /// already listed or because no such user exists.
    async fn add_to_want_to_go(&self, username: &str, destination: &str) -> Result<bool>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_user_sqlite(self.pool.sqlite()?, user).await,
            DatabaseDriver::Mysql => create_user_mysql(self.pool.mysql()?, user).await,
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_username_sqlite(self.pool.sqlite()?, username).await
            }
            DatabaseDriver::Mysql => {
                get_user_by_username_mysql(self.pool.mysql()?, username).await
            }
        }
    }

    async fn add_to_want_to_go(&self, username: &str, destination: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                add_to_want_to_go_sqlite(self.pool.sqlite()?, username, destination).await
            }
            DatabaseDriver::Mysql => {
                add_to_want_to_go_mysql(self.pool.mysql()?, username, destination).await
            }
        }
    }
}

/// Decode the stored JSON array; NULL means the list was never created.
fn parse_want_to_go(raw: Option<String>) -> Result<Option<Vec<String>>> {
    raw.map(|json| {
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid want-to-go list in database: {}", json))
    })
    .transpose()
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, password, created_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.password)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_rowid(),
        username: user.username.clone(),
        password: user.password.clone(),
        want_to_go_list: None,
        created_at: now,
    })
}

async fn get_user_by_username_sqlite(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, username, password, want_to_go_list, created_at
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by username")?;

    row.map(|row| row_to_user_sqlite(&row)).transpose()
}

async fn add_to_want_to_go_sqlite(
    pool: &SqlitePool,
    username: &str,
    destination: &str,
) -> Result<bool> {
    // `$[#]` addresses one past the last element, i.e. an append.
    let result = sqlx::query(
        r#"
        UPDATE users
        SET want_to_go_list = json_insert(COALESCE(want_to_go_list, '[]'), '$[#]', ?)
        WHERE username = ?
          AND NOT EXISTS (
              SELECT 1 FROM json_each(COALESCE(users.want_to_go_list, '[]'))
              WHERE json_each.value = ?
          )
        "#,
    )
    .bind(destination)
    .bind(username)
    .bind(destination)
    .execute(pool)
    .await
    .context("Failed to update want-to-go list")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        password: row.get("password"),
        want_to_go_list: parse_want_to_go(row.get("want_to_go_list"))?,
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, password, created_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.password)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_id() as i64,
        username: user.username.clone(),
        password: user.password.clone(),
        want_to_go_list: None,
        created_at: now,
    })
}

async fn get_user_by_username_mysql(pool: &MySqlPool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, username, password, want_to_go_list, created_at
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by username")?;

    row.map(|row| row_to_user_mysql(&row)).transpose()
}

async fn add_to_want_to_go_mysql(
    pool: &MySqlPool,
    username: &str,
    destination: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET want_to_go_list = JSON_ARRAY_APPEND(COALESCE(want_to_go_list, JSON_ARRAY()), '$', ?)
        WHERE username = ?
          AND NOT JSON_CONTAINS(COALESCE(want_to_go_list, JSON_ARRAY()), JSON_QUOTE(?))
        "#,
    )
    .bind(destination)
    .bind(username)
    .bind(destination)
    .execute(pool)
    .await
    .context("Failed to update want-to-go list")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        password: row.get("password"),
        want_to_go_list: parse_want_to_go(row.get("want_to_go_list"))?,
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, is_unique_violation, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxUserRepository::new(pool.clone());
        (pool, repo)
    }

    fn test_user(username: &str) -> User {
        User::new(username.to_string(), "password".to_string())
    }

    #[tokio::test]
    async fn test_create_user() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo.create(&test_user("alice")).await.expect("Failed to create user");

        assert!(created.id > 0);
        assert_eq!(created.username, "alice");
        assert_eq!(created.password, "password");
        assert!(created.want_to_go_list.is_none());
    }

    #[tokio::test]
    async fn test_get_user_by_username() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&test_user("findme")).await.expect("Failed to create user");

        let found = repo
            .get_by_username("findme")
            .await
            .expect("Failed to get user")
            .expect("User not found");

        assert_eq!(found.username, "findme");
        assert_eq!(found.password, "password");
        assert!(found.want_to_go_list.is_none());
    }

    #[tokio::test]
    async fn test_get_user_by_username_not_found() {
        let (_pool, repo) = setup_test_repo().await;

        let found = repo.get_by_username("nobody").await.expect("Failed to get user");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_username_lookup_is_case_sensitive() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&test_user("Alice")).await.expect("Failed to create user");

        let found = repo.get_by_username("alice").await.expect("Failed to get user");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_unique_violation() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&test_user("dup")).await.expect("Failed to create first user");

        let err = repo.create(&test_user("dup")).await.unwrap_err();

        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_add_to_want_to_go_appends_in_order() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&test_user("traveller")).await.unwrap();

        assert!(repo.add_to_want_to_go("traveller", "Paris").await.unwrap());
        assert!(repo.add_to_want_to_go("traveller", "Bali Island").await.unwrap());
        assert!(repo.add_to_want_to_go("traveller", "Rome").await.unwrap());

        let user = repo.get_by_username("traveller").await.unwrap().unwrap();
        assert_eq!(user.want_to_go(), ["Paris", "Bali Island", "Rome"]);
    }

    #[tokio::test]
    async fn test_add_to_want_to_go_rejects_duplicate() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&test_user("traveller")).await.unwrap();

        assert!(repo.add_to_want_to_go("traveller", "Paris").await.unwrap());
        assert!(!repo.add_to_want_to_go("traveller", "Paris").await.unwrap());

        let user = repo.get_by_username("traveller").await.unwrap().unwrap();
        assert_eq!(user.want_to_go(), ["Paris"]);
    }

    #[tokio::test]
    async fn test_add_to_want_to_go_is_exact_match() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&test_user("traveller")).await.unwrap();

        assert!(repo.add_to_want_to_go("traveller", "Paris").await.unwrap());
        assert!(repo.add_to_want_to_go("traveller", "paris").await.unwrap());

        let user = repo.get_by_username("traveller").await.unwrap().unwrap();
        assert_eq!(user.want_to_go().len(), 2);
    }

    #[tokio::test]
    async fn test_add_to_want_to_go_handles_quotes() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&test_user("traveller")).await.unwrap();

        let name = r#"Côte d'Azur "Riviera""#;
        assert!(repo.add_to_want_to_go("traveller", name).await.unwrap());
        assert!(!repo.add_to_want_to_go("traveller", name).await.unwrap());

        let user = repo.get_by_username("traveller").await.unwrap().unwrap();
        assert_eq!(user.want_to_go(), [name]);
    }

    #[tokio::test]
    async fn test_add_to_want_to_go_unknown_user() {
        let (_pool, repo) = setup_test_repo().await;

        let written = repo.add_to_want_to_go("ghost", "Paris").await.unwrap();

        assert!(!written);
    }

    #[tokio::test]
    async fn test_lists_are_per_user() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&test_user("a")).await.unwrap();
        repo.create(&test_user("b")).await.unwrap();

        repo.add_to_want_to_go("a", "Rome").await.unwrap();

        let b = repo.get_by_username("b").await.unwrap().unwrap();
        assert!(b.want_to_go_list.is_none());
        assert!(repo.add_to_want_to_go("b", "Rome").await.unwrap());
    }

    #[test]
    fn test_parse_want_to_go() {
        assert_eq!(parse_want_to_go(None).unwrap(), None);
        assert_eq!(
            parse_want_to_go(Some(r#"["Paris","Rome"]"#.to_string())).unwrap(),
            Some(vec!["Paris".to_string(), "Rome".to_string()])
        );
        assert!(parse_want_to_go(Some("not json".to_string())).is_err());
    }
}
