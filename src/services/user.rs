//! User service
//!
//! Implements account management for the people acting on content:
//! - User creation with argon2 password hashing and unique usernames
//! - Password check against the stored hash
//! - Permission grants
//! - Loading the `Actor` (user plus optional author identity)
//!
//! `AuthorService` turns users into authors and lists their posts.

use crate::db::is_unique_violation;
use crate::db::repositories::{AuthorRepository, PostRepository, UserRepository};
use crate::models::{Actor, Author, Post, PostFilter, User, USERNAME_MAX_LEN};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use std::sync::Arc;

/// Error types for user and author operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Username already taken
    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    /// User not found
    #[error("User not found: {0}")]
    NotFound(String),

    /// The user already has an author identity
    #[error("User {0} is already an author")]
    AlreadyAuthor(i64),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for managing accounts
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    author_repo: Arc<dyn AuthorRepository>,
}

impl UserService {
    /// Create a new user service with the given repositories
    pub fn new(user_repo: Arc<dyn UserRepository>, author_repo: Arc<dyn AuthorRepository>) -> Self {
        Self {
            user_repo,
            author_repo,
        }
    }

    /// Create a user account
    ///
    /// # Errors
    /// - `ValidationError` for an empty or over-long username, an empty
    ///   password or an email without `@`
    /// - `DuplicateUsername` if the username is taken
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, UserServiceError> {
        let username = username.trim();
        let email = email.trim();
        Self::validate(username, email, password)?;

        if self.user_repo.exists_by_username(username).await? {
            return Err(UserServiceError::DuplicateUsername(username.to_string()));
        }

        let password_hash = hash_password(password).context("Failed to hash password")?;
        let user = User::new(username.to_string(), email.to_string(), password_hash);

        let created = self.user_repo.create(&user).await.map_err(|e| {
            if is_unique_violation(&e) {
                UserServiceError::DuplicateUsername(username.to_string())
            } else {
                UserServiceError::InternalError(e)
            }
        })?;

        tracing::info!("User {} '{}' created", created.id, created.username);
        Ok(created)
    }

    /// Check a username and password pair
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(username.trim())
            .await?
            .ok_or_else(|| UserServiceError::AuthenticationError("Invalid username or password".to_string()))?;

        let valid = verify_password(password, &user.password_hash).context("Failed to verify password")?;
        if !valid {
            tracing::warn!("Failed password check for '{}'", user.username);
            return Err(UserServiceError::AuthenticationError(
                "Invalid username or password".to_string(),
            ));
        }

        Ok(user)
    }

    /// Get a user by ID, permissions included
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self.user_repo.get_by_id(id).await?)
    }

    /// Grant a permission codename. Granting twice is a no-op.
    pub async fn grant_permission(&self, user_id: i64, codename: &str) -> Result<(), UserServiceError> {
        if self.user_repo.get_by_id(user_id).await?.is_none() {
            return Err(UserServiceError::NotFound(user_id.to_string()));
        }

        self.user_repo.grant_permission(user_id, codename).await?;
        tracing::info!("Granted '{}' to user {}", codename, user_id);
        Ok(())
    }

    /// Withdraw a permission codename
    pub async fn revoke_permission(&self, user_id: i64, codename: &str) -> Result<(), UserServiceError> {
        self.user_repo.revoke_permission(user_id, codename).await?;
        tracing::info!("Revoked '{}' from user {}", codename, user_id);
        Ok(())
    }

    /// Load the acting identity for a user
    pub async fn actor(&self, user_id: i64) -> Result<Actor, UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| UserServiceError::NotFound(user_id.to_string()))?;
        let author = self.author_repo.get_by_user_id(user_id).await?;

        Ok(Actor::new(user, author))
    }

    fn validate(username: &str, email: &str, password: &str) -> Result<(), UserServiceError> {
        if username.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username cannot be empty".to_string(),
            ));
        }

        if username.chars().count() > USERNAME_MAX_LEN {
            return Err(UserServiceError::ValidationError(format!(
                "Username cannot exceed {} characters",
                USERNAME_MAX_LEN
            )));
        }

        if password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Password cannot be empty".to_string(),
            ));
        }

        // Basic email format validation
        if !email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }

        Ok(())
    }
}

/// Author service: the author identity composed over a user
pub struct AuthorService {
    author_repo: Arc<dyn AuthorRepository>,
    user_repo: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
}

impl AuthorService {
    pub fn new(
        author_repo: Arc<dyn AuthorRepository>,
        user_repo: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
    ) -> Self {
        Self {
            author_repo,
            user_repo,
            posts,
        }
    }

    /// Give a user its author identity
    ///
    /// # Errors
    /// - `NotFound` if the user does not exist
    /// - `AlreadyAuthor` if the user has one already
    pub async fn make_author(&self, user_id: i64, avatar: Option<String>) -> Result<Author, UserServiceError> {
        if self.user_repo.get_by_id(user_id).await?.is_none() {
            return Err(UserServiceError::NotFound(user_id.to_string()));
        }
        if self.author_repo.get_by_user_id(user_id).await?.is_some() {
            return Err(UserServiceError::AlreadyAuthor(user_id));
        }

        let author = self
            .author_repo
            .create(&Author::new(user_id, avatar))
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    UserServiceError::AlreadyAuthor(user_id)
                } else {
                    UserServiceError::InternalError(e)
                }
            })?;

        tracing::info!("User {} is now author {}", user_id, author.id);
        Ok(author)
    }

    /// Get an author by ID
    pub async fn get(&self, id: i64) -> Result<Option<Author>, UserServiceError> {
        Ok(self.author_repo.get_by_id(id).await?)
    }

    /// Every post by the author, in the default post order
    pub async fn get_posts(&self, author: &Author) -> Result<Vec<Post>, UserServiceError> {
        let filter = PostFilter::new().with_author(author.id);
        Ok(self.posts.list(None, &filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        CategoryRepository, SqlxAuthorRepository, SqlxCategoryRepository, SqlxPostRepository,
        SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{Category, PERM_PUBLISH_POST};

    async fn setup() -> (DynDatabasePool, UserService, AuthorService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxAuthorRepository::boxed(pool.clone()),
        );
        let authors = AuthorService::new(
            SqlxAuthorRepository::boxed(pool.clone()),
            SqlxUserRepository::boxed(pool.clone()),
            SqlxPostRepository::boxed(pool.clone()),
        );
        (pool, users, authors)
    }

    #[tokio::test]
    async fn test_create_user_hashes_password() {
        let (_pool, users, _) = setup().await;

        let user = users.create_user("alice", "alice@example.com", "s3cret!").await.unwrap();
        assert!(user.id > 0);
        assert_ne!(user.password_hash, "s3cret!");
        assert!(user.password_hash.starts_with("$argon2"));

        let authed = users.authenticate("alice", "s3cret!").await.unwrap();
        assert_eq!(authed.id, user.id);
        assert!(matches!(
            users.authenticate("alice", "wrong").await,
            Err(UserServiceError::AuthenticationError(_))
        ));
        assert!(matches!(
            users.authenticate("nobody", "s3cret!").await,
            Err(UserServiceError::AuthenticationError(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let (_pool, users, _) = setup().await;
        users.create_user("alice", "a@example.com", "pw").await.unwrap();

        assert!(matches!(
            users.create_user("alice", "other@example.com", "pw").await,
            Err(UserServiceError::DuplicateUsername(name)) if name == "alice"
        ));
    }

    #[tokio::test]
    async fn test_create_user_validation() {
        let (_pool, users, _) = setup().await;

        for (username, email, password) in [
            ("", "a@example.com", "pw"),
            ("bob", "no-at-sign", "pw"),
            ("bob", "bob@example.com", ""),
        ] {
            assert!(matches!(
                users.create_user(username, email, password).await,
                Err(UserServiceError::ValidationError(_))
            ));
        }

        let long = "u".repeat(USERNAME_MAX_LEN + 1);
        assert!(matches!(
            users.create_user(&long, "u@example.com", "pw").await,
            Err(UserServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_grant_permission_shows_in_actor() {
        let (_pool, users, _) = setup().await;
        let user = users.create_user("editor", "e@example.com", "pw").await.unwrap();

        assert!(!users.actor(user.id).await.unwrap().has_perm(PERM_PUBLISH_POST));

        users.grant_permission(user.id, PERM_PUBLISH_POST).await.unwrap();
        users.grant_permission(user.id, PERM_PUBLISH_POST).await.unwrap();
        let actor = users.actor(user.id).await.unwrap();
        assert!(actor.has_perm(PERM_PUBLISH_POST));
        assert_eq!(actor.user.permissions, vec![PERM_PUBLISH_POST.to_string()]);

        users.revoke_permission(user.id, PERM_PUBLISH_POST).await.unwrap();
        assert!(!users.actor(user.id).await.unwrap().has_perm(PERM_PUBLISH_POST));

        assert!(matches!(
            users.grant_permission(9999, PERM_PUBLISH_POST).await,
            Err(UserServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_actor_loads_author_identity() {
        let (_pool, users, authors) = setup().await;
        let user = users.create_user("writer", "w@example.com", "pw").await.unwrap();

        let actor = users.actor(user.id).await.unwrap();
        assert!(!actor.is_author());

        let author = authors
            .make_author(user.id, Some("avatars/w.png".to_string()))
            .await
            .unwrap();
        let actor = users.actor(user.id).await.unwrap();
        assert_eq!(actor.author_id(), Some(author.id));
        assert_eq!(actor.author.unwrap().avatar.as_deref(), Some("avatars/w.png"));

        assert!(matches!(users.actor(9999).await, Err(UserServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_make_author_once_per_user() {
        let (_pool, users, authors) = setup().await;
        let user = users.create_user("writer", "w@example.com", "pw").await.unwrap();

        authors.make_author(user.id, None).await.unwrap();
        assert!(matches!(
            authors.make_author(user.id, None).await,
            Err(UserServiceError::AlreadyAuthor(id)) if id == user.id
        ));
        assert!(matches!(
            authors.make_author(9999, None).await,
            Err(UserServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_author_get_posts() {
        let (pool, users, authors) = setup().await;
        let category = SqlxCategoryRepository::new(pool.clone())
            .create(&Category::new("Rust".to_string(), String::new()))
            .await
            .unwrap();

        let mine = users.create_user("mine", "m@example.com", "pw").await.unwrap();
        let theirs = users.create_user("theirs", "t@example.com", "pw").await.unwrap();
        let mine = authors.make_author(mine.id, None).await.unwrap();
        let theirs = authors.make_author(theirs.id, None).await.unwrap();

        let posts = SqlxPostRepository::new(pool.clone());
        for (slug, author_id) in [("a", mine.id), ("b", mine.id), ("c", theirs.id)] {
            let mut post = Post::new("T".into(), "S".into(), "C".into(), category.id).with_slug(slug);
            post.author_id = author_id;
            posts.create(&post).await.unwrap();
        }

        let listed = authors.get_posts(&mine).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|p| p.author_id == mine.id));
        assert_eq!(authors.get(mine.id).await.unwrap(), Some(mine));
    }
}
