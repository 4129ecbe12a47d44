//! Author repository
//!
//! Database operations for authors. An author row belongs to exactly one
//! user, and a user has at most one author row.

use crate::db::{Backend, DynDatabasePool};
use crate::models::Author;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Author repository trait
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Create a new author
    async fn create(&self, author: &Author) -> Result<Author>;

    /// Get author by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Author>>;

    /// Get the author row of a user
    async fn get_by_user_id(&self, user_id: i64) -> Result<Option<Author>>;

    /// Delete an author. Fails while posts reference it.
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based author repository implementation
pub struct SqlxAuthorRepository {
    pool: DynDatabasePool,
}

impl SqlxAuthorRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AuthorRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AuthorRepository for SqlxAuthorRepository {
    async fn create(&self, author: &Author) -> Result<Author> {
        let sql = "INSERT INTO authors (user_id, avatar) VALUES (?, ?)";
        let id = match self.pool.backend() {
            Backend::Sqlite(p) => sqlx::query(sql)
                .bind(author.user_id)
                .bind(&author.avatar)
                .execute(p)
                .await
                .context("Failed to create author")?
                .last_insert_rowid(),
            Backend::Mysql(p) => sqlx::query(sql)
                .bind(author.user_id)
                .bind(&author.avatar)
                .execute(p)
                .await
                .context("Failed to create author")?
                .last_insert_id() as i64,
        };

        Ok(Author {
            id,
            ..author.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Author>> {
        let sql = "SELECT id, user_id, avatar FROM authors WHERE id = ?";
        match self.pool.backend() {
            Backend::Sqlite(p) => get_author_sqlite(p, sql, id).await,
            Backend::Mysql(p) => get_author_mysql(p, sql, id).await,
        }
    }

    async fn get_by_user_id(&self, user_id: i64) -> Result<Option<Author>> {
        let sql = "SELECT id, user_id, avatar FROM authors WHERE user_id = ?";
        match self.pool.backend() {
            Backend::Sqlite(p) => get_author_sqlite(p, sql, user_id).await,
            Backend::Mysql(p) => get_author_mysql(p, sql, user_id).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let sql = "DELETE FROM authors WHERE id = ?";
        match self.pool.backend() {
            Backend::Sqlite(p) => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(p)
                    .await
                    .context("Failed to delete author")?;
            }
            Backend::Mysql(p) => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(p)
                    .await
                    .context("Failed to delete author")?;
            }
        }
        Ok(())
    }
}

async fn get_author_sqlite(pool: &SqlitePool, sql: &str, key: i64) -> Result<Option<Author>> {
    let row = sqlx::query(sql)
        .bind(key)
        .fetch_optional(pool)
        .await
        .context("Failed to get author")?;

    Ok(row.map(|row| Author {
        id: row.get("id"),
        user_id: row.get("user_id"),
        avatar: row.get("avatar"),
    }))
}

async fn get_author_mysql(pool: &MySqlPool, sql: &str, key: i64) -> Result<Option<Author>> {
    let row = sqlx::query(sql)
        .bind(key)
        .fetch_optional(pool)
        .await
        .context("Failed to get author")?;

    Ok(row.map(|row| Author {
        id: row.get("id"),
        user_id: row.get("user_id"),
        avatar: row.get("avatar"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxAuthorRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let user_id = sqlx::query("INSERT INTO users (username, email, password_hash) VALUES ('writer', 'w@example.com', 'hash')")
            .execute(pool.as_sqlite().unwrap())
            .await
            .expect("Failed to create user")
            .last_insert_rowid();
        let repo = SqlxAuthorRepository::new(pool.clone());
        (pool, repo, user_id)
    }

    #[tokio::test]
    async fn test_create_and_get_author() {
        let (_pool, repo, user_id) = setup_test_repo().await;

        let author = repo
            .create(&Author::new(user_id, Some("avatars/w.png".to_string())))
            .await
            .expect("Failed to create author");
        assert!(author.id > 0);

        let by_id = repo.get_by_id(author.id).await.unwrap().expect("Author by id");
        assert_eq!(by_id.avatar.as_deref(), Some("avatars/w.png"));

        let by_user = repo.get_by_user_id(user_id).await.unwrap().expect("Author by user");
        assert_eq!(by_user.id, author.id);
        assert!(repo.get_by_user_id(user_id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_one_author_per_user() {
        let (_pool, repo, user_id) = setup_test_repo().await;

        repo.create(&Author::new(user_id, None)).await.unwrap();
        let err = repo
            .create(&Author::new(user_id, None))
            .await
            .expect_err("Second author for the same user should fail");
        assert!(crate::db::is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_delete_author() {
        let (_pool, repo, user_id) = setup_test_repo().await;

        let author = repo.create(&Author::new(user_id, None)).await.unwrap();
        repo.delete(author.id).await.expect("Failed to delete author");
        assert!(repo.get_by_id(author.id).await.unwrap().is_none());
    }
}
