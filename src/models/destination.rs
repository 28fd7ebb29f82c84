//! Destination model

use serde::{Deserialize, Serialize};

/// A catalog entry: the name shown to users and the route of its page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
    pub link: String,
}

impl Destination {
    pub fn new(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
        }
    }
}
