//! User model
//!
//! A registered traveller: credentials plus the destinations they have
//! saved to their want-to-go list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity.
///
/// The password is stored and compared verbatim, with no hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique, never changes)
    pub username: String,
    // TODO: replace with a salted one-way hash and constant-time comparison
    #[serde(skip_serializing)]
    pub password: String,
    /// Saved destination names in the order they were added.
    /// `None` until the first destination is saved.
    pub want_to_go_list: Option<Vec<String>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with no saved destinations.
    pub fn new(username: String, password: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            username,
            password,
            want_to_go_list: None,
            created_at: Utc::now(),
        }
    }

    /// Saved destinations, empty when the list was never created
    pub fn want_to_go(&self) -> &[String] {
        self.want_to_go_list.as_deref().unwrap_or(&[])
    }

    /// Exact, case-sensitive comparison against the stored password
    pub fn password_matches(&self, password: &str) -> bool {
        self.password == password
    }
}
