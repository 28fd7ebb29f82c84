//! Services layer - Business logic
//!
//! - [`catalog`]: the read-only destination catalog and its search
//! - [`user`]: accounts, sessions and want-to-go lists

pub mod catalog;
pub mod user;

pub use catalog::Catalog;
pub use user::{LoginInput, RegisterInput, UserService, UserServiceError};
