//! Data models
//!
//! This module contains the data structures used throughout Wanderlist:
//! - Persisted entities (User, Session)
//! - The static catalog entry (Destination)

mod destination;
mod session;
mod user;

pub use destination::Destination;
pub use session::Session;
pub use user::User;
