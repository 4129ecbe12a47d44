//! Category model
//!
//! Categories group posts. A category cannot be deleted while a post
//! references it.

use serde::{Deserialize, Serialize};

/// Maximum category name length
pub const CATEGORY_NAME_MAX_LEN: usize = 32;

/// Maximum category description length
pub const CATEGORY_DESCRIPTION_MAX_LEN: usize = 128;

/// Category entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Unique identifier
    pub id: i64,
    /// Category name
    pub name: String,
    /// Category description
    pub description: String,
}

impl Category {
    /// Create a new Category with the given parameters.
    ///
    /// The ID will be set to 0 and should be assigned by the database.
    pub fn new(name: String, description: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            name,
            description,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
