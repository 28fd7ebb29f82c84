//! User service
//!
//! Business logic for accounts and their want-to-go lists:
//! - Registration and login
//! - Session issue, validation and cleanup
//! - Adding to and reading a user's want-to-go list

use crate::db::is_unique_violation;
use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, User};
use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Unknown user or wrong password
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Username already taken
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Destination already on the user's list
    #[error("Already listed: {0}")]
    AlreadyListed(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for managing users and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    /// Create a new user service with the given repositories
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self::with_session_expiration(user_repo, session_repo, DEFAULT_SESSION_EXPIRATION_DAYS)
    }

    /// Create a new user service with custom session expiration
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if username or password is empty
    /// - `UserExists` if the username is taken
    /// - `InternalError` for database errors
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        if input.username.is_empty() || input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username and password are required".to_string(),
            ));
        }

        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check for existing user")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(input.username));
        }

        let user = User::new(input.username, input.password);
        match self.user_repo.create(&user).await {
            Ok(created) => {
                tracing::info!("Registered user {}", created.username);
                Ok(created)
            }
            // Lost a race with a concurrent registration
            Err(e) if is_unique_violation(&e) => Err(UserServiceError::UserExists(user.username)),
            Err(e) => Err(UserServiceError::InternalError(
                e.context("Failed to create user"),
            )),
        }
    }

    /// Check credentials and open a new session.
    ///
    /// An unknown username and a wrong password produce the same error.
    pub async fn login(&self, input: LoginInput) -> Result<Session, UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to get user by username")?;

        match user {
            Some(user) if user.password_matches(&input.password) => {
                self.create_session(&user.username).await
            }
            _ => {
                tracing::debug!("Failed login attempt for {:?}", input.username);
                Err(UserServiceError::AuthenticationError(
                    "Invalid username or password".to_string(),
                ))
            }
        }
    }

    /// Resolve a session token.
    ///
    /// Returns `None` if the session doesn't exist or is expired. Expired
    /// sessions are deleted on sight.
    pub async fn validate_session(&self, token: &str) -> Result<Option<Session>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            if let Err(e) = self.session_repo.delete(token).await {
                tracing::warn!("Failed to delete expired session: {:#}", e);
            }
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Append a destination to the user's want-to-go list.
    ///
    /// # Errors
    ///
    /// - `AlreadyListed` if the exact name is already on the list
    /// - `InternalError` for database errors, or if the user vanished
    pub async fn add_to_want_to_go(
        &self,
        username: &str,
        destination: &str,
    ) -> Result<(), UserServiceError> {
        let added = self
            .user_repo
            .add_to_want_to_go(username, destination)
            .await
            .context("Failed to update want-to-go list")?;

        if added {
            return Ok(());
        }

        // Nothing written: either already listed, or no such user
        let exists = self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to get user by username")?
            .is_some();

        if exists {
            Err(UserServiceError::AlreadyListed(destination.to_string()))
        } else {
            Err(UserServiceError::InternalError(anyhow::anyhow!(
                "User {} not found",
                username
            )))
        }
    }

    /// The user's saved destinations in insertion order, empty when none
    pub async fn want_to_go_list(&self, username: &str) -> Result<Vec<String>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to get user by username")?;

        Ok(user.and_then(|u| u.want_to_go_list).unwrap_or_default())
    }

    /// Delete all expired sessions, returning how many were removed.
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;

        Ok(count)
    }

    async fn create_session(&self, username: &str) -> Result<Session, UserServiceError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            expires_at: now + Duration::days(self.session_expiration_days),
            created_at: now,
        };

        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(created)
    }
}

/// Input for user registration
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
}

impl RegisterInput {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Input for user login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup_test_service() -> (DynDatabasePool, UserService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let service = UserService::new(user_repo, session_repo);

        (pool, service)
    }

    async fn count_users(pool: &DynDatabasePool, username: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(pool.sqlite().unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_success() {
        let (_pool, service) = setup_test_service().await;

        let user = service
            .register(RegisterInput::new("alice", "secret"))
            .await
            .expect("Registration should succeed");

        assert!(user.id > 0);
        assert_eq!(user.username, "alice");
        assert!(user.want_to_go_list.is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_username_fails() {
        let (pool, service) = setup_test_service().await;
        service.register(RegisterInput::new("alice", "one")).await.unwrap();

        let result = service.register(RegisterInput::new("alice", "two")).await;

        assert!(matches!(result, Err(UserServiceError::UserExists(_))));
        assert_eq!(count_users(&pool, "alice").await, 1);
    }

    #[tokio::test]
    async fn test_register_empty_username_fails() {
        let (pool, service) = setup_test_service().await;

        let result = service.register(RegisterInput::new("", "secret")).await;

        assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
        assert_eq!(count_users(&pool, "").await, 0);
    }

    #[tokio::test]
    async fn test_register_empty_password_fails() {
        let (pool, service) = setup_test_service().await;

        let result = service.register(RegisterInput::new("alice", "")).await;

        assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
        assert_eq!(count_users(&pool, "alice").await, 0);
    }

    #[tokio::test]
    async fn test_register_whitespace_username_is_accepted() {
        let (_pool, service) = setup_test_service().await;

        let result = service.register(RegisterInput::new(" ", "secret")).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_login_success() {
        let (_pool, service) = setup_test_service().await;
        service.register(RegisterInput::new("alice", "secret")).await.unwrap();

        let session = service
            .login(LoginInput::new("alice", "secret"))
            .await
            .expect("Login should succeed");

        assert_eq!(session.username, "alice");
        assert!(!session.is_expired());
        assert!(Uuid::parse_str(&session.id).is_ok());
    }

    #[tokio::test]
    async fn test_login_wrong_password_fails() {
        let (_pool, service) = setup_test_service().await;
        service.register(RegisterInput::new("alice", "secret")).await.unwrap();

        let result = service.login(LoginInput::new("alice", "Secret")).await;

        assert!(matches!(result, Err(UserServiceError::AuthenticationError(_))));
    }

    #[tokio::test]
    async fn test_login_nonexistent_user_fails() {
        let (_pool, service) = setup_test_service().await;

        let result = service.login(LoginInput::new("nobody", "secret")).await;

        assert!(matches!(result, Err(UserServiceError::AuthenticationError(_))));
    }

    #[tokio::test]
    async fn test_validate_session_success() {
        let (_pool, service) = setup_test_service().await;
        service.register(RegisterInput::new("alice", "secret")).await.unwrap();
        let session = service.login(LoginInput::new("alice", "secret")).await.unwrap();

        let validated = service
            .validate_session(&session.id)
            .await
            .expect("Validation should not error")
            .expect("Session should be valid");

        assert_eq!(validated.username, "alice");
    }

    #[tokio::test]
    async fn test_validate_session_nonexistent_returns_none() {
        let (_pool, service) = setup_test_service().await;

        let result = service.validate_session("not-a-session").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_validate_expired_session_returns_none_and_deletes() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let service = UserService::with_session_expiration(
            SqlxUserRepository::boxed(pool.clone()),
            session_repo.clone(),
            -1,
        );
        service.register(RegisterInput::new("alice", "secret")).await.unwrap();
        let session = service.login(LoginInput::new("alice", "secret")).await.unwrap();

        let result = service.validate_session(&session.id).await.unwrap();

        assert!(result.is_none());
        assert!(session_repo.get_by_id(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cleanup_expired_sessions() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let expired_service = UserService::with_session_expiration(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            -1,
        );
        expired_service
            .register(RegisterInput::new("alice", "secret"))
            .await
            .unwrap();
        expired_service.login(LoginInput::new("alice", "secret")).await.unwrap();
        expired_service.login(LoginInput::new("alice", "secret")).await.unwrap();

        let deleted = expired_service.cleanup_expired_sessions().await.unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(expired_service.cleanup_expired_sessions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_to_want_to_go() {
        let (_pool, service) = setup_test_service().await;
        service.register(RegisterInput::new("alice", "secret")).await.unwrap();

        service.add_to_want_to_go("alice", "Paris").await.unwrap();
        service.add_to_want_to_go("alice", "Bali Island").await.unwrap();

        let list = service.want_to_go_list("alice").await.unwrap();
        assert_eq!(list, vec!["Paris", "Bali Island"]);
    }

    #[tokio::test]
    async fn test_add_duplicate_to_want_to_go_fails_without_change() {
        let (_pool, service) = setup_test_service().await;
        service.register(RegisterInput::new("alice", "secret")).await.unwrap();
        service.add_to_want_to_go("alice", "Paris").await.unwrap();

        let result = service.add_to_want_to_go("alice", "Paris").await;

        assert!(matches!(result, Err(UserServiceError::AlreadyListed(_))));
        assert_eq!(service.want_to_go_list("alice").await.unwrap(), vec!["Paris"]);
    }

    #[tokio::test]
    async fn test_add_to_want_to_go_unknown_user_is_internal_error() {
        let (_pool, service) = setup_test_service().await;

        let result = service.add_to_want_to_go("ghost", "Paris").await;

        assert!(matches!(result, Err(UserServiceError::InternalError(_))));
    }

    #[tokio::test]
    async fn test_want_to_go_list_empty_for_new_user() {
        let (_pool, service) = setup_test_service().await;
        service.register(RegisterInput::new("alice", "secret")).await.unwrap();

        let list = service.want_to_go_list("alice").await.unwrap();

        assert!(list.is_empty());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};
    use proptest::prelude::*;

    async fn setup_property_test_service() -> UserService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Logging in with the registered credentials yields a session that
        /// resolves back to the same user; any other password is rejected.
        #[test]
        fn login_roundtrip(
            username in "[a-z]{3,10}",
            password in "[a-zA-Z0-9!@#$%^&*]{1,20}",
            wrong in "[a-zA-Z0-9]{1,20}"
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let service = setup_property_test_service().await;
                service
                    .register(RegisterInput::new(username.clone(), password.clone()))
                    .await
                    .expect("Registration should succeed");

                let session = service
                    .login(LoginInput::new(username.clone(), password.clone()))
                    .await
                    .expect("Login should succeed");
                let validated = service
                    .validate_session(&session.id)
                    .await
                    .expect("Validation should not error");
                prop_assert_eq!(validated.map(|s| s.username), Some(username.clone()));

                if wrong != password {
                    let rejected = service.login(LoginInput::new(username.clone(), wrong.clone())).await;
                    prop_assert!(matches!(rejected, Err(UserServiceError::AuthenticationError(_))));
                }
                Ok(())
            });
            result?;
        }

        /// Adding names one by one keeps each name once, in first-seen order.
        #[test]
        fn want_to_go_is_ordered_set(names in prop::collection::vec("[A-C]{1,2}", 1..8)) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let service = setup_property_test_service().await;
                service.register(RegisterInput::new("alice", "pw")).await.unwrap();

                let mut expected: Vec<String> = Vec::new();
                for name in &names {
                    let outcome = service.add_to_want_to_go("alice", name).await;
                    if expected.contains(name) {
                        prop_assert!(matches!(outcome, Err(UserServiceError::AlreadyListed(_))));
                    } else {
                        prop_assert!(outcome.is_ok());
                        expected.push(name.clone());
                    }
                }

                prop_assert_eq!(service.want_to_go_list("alice").await.unwrap(), expected);
                Ok(())
            });
            result?;
        }
    }
}
