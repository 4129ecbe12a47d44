//! Author model
//!
//! An author is the publishing identity of a user. Each user has at most one
//! author row, and each author owns zero or more posts.

use serde::{Deserialize, Serialize};

/// Author entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Author {
    /// Unique identifier
    pub id: i64,
    /// The user this author belongs to (one-to-one)
    pub user_id: i64,
    /// Avatar image reference
    pub avatar: Option<String>,
}

impl Author {
    pub fn new(user_id: i64, avatar: Option<String>) -> Self {
        Self {
            id: 0, // Will be set by the database
            user_id,
            avatar,
        }
    }
}
