//! User model
//!
//! This module defines the generic user identity and the `Actor` that
//! performs mutating operations.
//!
//! An `Actor` couples a user with the author identity it may own. Authors are
//! composed over users rather than extending them, so a user without an
//! author row can exist and still act (for example to publish).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Author;

/// Maximum username length
pub const USERNAME_MAX_LEN: usize = 150;

/// Permission codename required to publish posts.
pub const PERM_PUBLISH_POST: &str = "can_publish_post";

/// User entity representing a registered account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Email address
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Superusers hold every permission
    pub is_superuser: bool,
    /// Granted permission codenames
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// Note: The password should already be hashed before calling this function.
    /// Use `services::password::hash_password()` to hash the password.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            username,
            email,
            password_hash,
            is_superuser: false,
            permissions: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Mark the user as superuser
    pub fn with_superuser(mut self, is_superuser: bool) -> Self {
        self.is_superuser = is_superuser;
        self
    }

    /// Check whether the user holds the given permission
    pub fn has_perm(&self, codename: &str) -> bool {
        self.is_superuser || self.permissions.iter().any(|p| p == codename)
    }
}

/// The identity performing an operation: a user plus its optional author row.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub user: User,
    pub author: Option<Author>,
}

impl Actor {
    pub fn new(user: User, author: Option<Author>) -> Self {
        Self { user, author }
    }

    /// Check whether the actor has an author identity
    pub fn is_author(&self) -> bool {
        self.author.is_some()
    }

    /// Author ID of the actor, if it has an author identity
    pub fn author_id(&self) -> Option<i64> {
        self.author.as_ref().map(|a| a.id)
    }

    pub fn has_perm(&self, codename: &str) -> bool {
        self.user.has_perm(codename)
    }
}
