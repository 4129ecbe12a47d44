//! User repository
//!
//! Database operations for users and their permission codenames.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL

use crate::db::{Backend, DynDatabasePool};
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user together with its permissions
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID, permissions loaded
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username, permissions loaded
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Check if a username is taken
    async fn exists_by_username(&self, username: &str) -> Result<bool>;

    /// Grant a permission codename. Granting twice is a no-op.
    async fn grant_permission(&self, user_id: i64, codename: &str) -> Result<()>;

    /// Revoke a permission codename
    async fn revoke_permission(&self, user_id: i64, codename: &str) -> Result<()>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
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
        match self.pool.backend() {
            Backend::Sqlite(p) => create_user_sqlite(p, user).await,
            Backend::Mysql(p) => create_user_mysql(p, user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.backend() {
            Backend::Sqlite(p) => get_user_sqlite(p, "id = ?", UserKey::Id(id)).await,
            Backend::Mysql(p) => get_user_mysql(p, "id = ?", UserKey::Id(id)).await,
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.pool.backend() {
            Backend::Sqlite(p) => get_user_sqlite(p, "username = ?", UserKey::Username(username)).await,
            Backend::Mysql(p) => get_user_mysql(p, "username = ?", UserKey::Username(username)).await,
        }
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool> {
        Ok(self.get_by_username(username).await?.is_some())
    }

    async fn grant_permission(&self, user_id: i64, codename: &str) -> Result<()> {
        match self.pool.backend() {
            Backend::Sqlite(p) => {
                sqlx::query("INSERT OR IGNORE INTO user_permissions (user_id, codename) VALUES (?, ?)")
                    .bind(user_id)
                    .bind(codename)
                    .execute(p)
                    .await
                    .context("Failed to grant permission")?;
            }
            Backend::Mysql(p) => {
                sqlx::query("INSERT IGNORE INTO user_permissions (user_id, codename) VALUES (?, ?)")
                    .bind(user_id)
                    .bind(codename)
                    .execute(p)
                    .await
                    .context("Failed to grant permission")?;
            }
        }
        Ok(())
    }

    async fn revoke_permission(&self, user_id: i64, codename: &str) -> Result<()> {
        let sql = "DELETE FROM user_permissions WHERE user_id = ? AND codename = ?";
        match self.pool.backend() {
            Backend::Sqlite(p) => {
                sqlx::query(sql)
                    .bind(user_id)
                    .bind(codename)
                    .execute(p)
                    .await
                    .context("Failed to revoke permission")?;
            }
            Backend::Mysql(p) => {
                sqlx::query(sql)
                    .bind(user_id)
                    .bind(codename)
                    .execute(p)
                    .await
                    .context("Failed to revoke permission")?;
            }
        }
        Ok(())
    }
}

/// Lookup key for a single user
#[derive(Debug, Clone, Copy)]
enum UserKey<'a> {
    Id(i64),
    Username(&'a str),
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let result = sqlx::query(
        "INSERT INTO users (username, email, password_hash, is_superuser, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_superuser)
    .bind(user.created_at)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    let id = result.last_insert_rowid();

    for codename in &user.permissions {
        sqlx::query("INSERT OR IGNORE INTO user_permissions (user_id, codename) VALUES (?, ?)")
            .bind(id)
            .bind(codename)
            .execute(pool)
            .await
            .context("Failed to store user permission")?;
    }

    Ok(User {
        id,
        ..user.clone()
    })
}

async fn get_user_sqlite(pool: &SqlitePool, condition: &str, key: UserKey<'_>) -> Result<Option<User>> {
    let sql = format!(
        "SELECT id, username, email, password_hash, is_superuser, created_at FROM users WHERE {}",
        condition
    );
    let query = sqlx::query(&sql);
    let query = match key {
        UserKey::Id(id) => query.bind(id),
        UserKey::Username(username) => query.bind(username),
    };

    let row = query
        .fetch_optional(pool)
        .await
        .context("Failed to get user")?;

    let Some(row) = row else {
        return Ok(None);
    };

    let id: i64 = row.get("id");
    let permissions: Vec<String> = sqlx::query("SELECT codename FROM user_permissions WHERE user_id = ? ORDER BY codename")
        .bind(id)
        .fetch_all(pool)
        .await
        .context("Failed to get user permissions")?
        .iter()
        .map(|r| r.get("codename"))
        .collect();

    Ok(Some(User {
        id,
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_superuser: row.get("is_superuser"),
        permissions,
        created_at: row.get("created_at"),
    }))
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let result = sqlx::query(
        "INSERT INTO users (username, email, password_hash, is_superuser, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_superuser)
    .bind(user.created_at)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    let id = result.last_insert_id() as i64;

    for codename in &user.permissions {
        sqlx::query("INSERT IGNORE INTO user_permissions (user_id, codename) VALUES (?, ?)")
            .bind(id)
            .bind(codename)
            .execute(pool)
            .await
            .context("Failed to store user permission")?;
    }

    Ok(User {
        id,
        ..user.clone()
    })
}

async fn get_user_mysql(pool: &MySqlPool, condition: &str, key: UserKey<'_>) -> Result<Option<User>> {
    let sql = format!(
        "SELECT id, username, email, password_hash, is_superuser, created_at FROM users WHERE {}",
        condition
    );
    let query = sqlx::query(&sql);
    let query = match key {
        UserKey::Id(id) => query.bind(id),
        UserKey::Username(username) => query.bind(username),
    };

    let row = query
        .fetch_optional(pool)
        .await
        .context("Failed to get user")?;

    let Some(row) = row else {
        return Ok(None);
    };

    let id: i64 = row.get("id");
    let permissions: Vec<String> = sqlx::query("SELECT codename FROM user_permissions WHERE user_id = ? ORDER BY codename")
        .bind(id)
        .fetch_all(pool)
        .await
        .context("Failed to get user permissions")?
        .iter()
        .map(|r| r.get("codename"))
        .collect();

    Ok(Some(User {
        id,
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_superuser: row.get("is_superuser"),
        permissions,
        created_at: row.get("created_at"),
    }))
}
