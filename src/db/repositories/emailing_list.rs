//! Emailing list repository
//!
//! Database operations for emailing lists. The subscriber column is opaque
//! JSON text at this layer.

use crate::db::{Backend, DynDatabasePool};
use crate::models::EmailingList;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Emailing list repository trait
#[async_trait]
pub trait EmailingListRepository: Send + Sync {
    /// Create a new list
    async fn create(&self, list: &EmailingList) -> Result<EmailingList>;

    /// Get list by name
    async fn get_by_name(&self, name: &str) -> Result<Option<EmailingList>>;

    /// Overwrite the stored subscriber column
    async fn update_emails(&self, id: i64, emails: &str) -> Result<()>;
}

/// SQLx-based emailing list repository implementation
pub struct SqlxEmailingListRepository {
    pool: DynDatabasePool,
}

impl SqlxEmailingListRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn EmailingListRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl EmailingListRepository for SqlxEmailingListRepository {
    async fn create(&self, list: &EmailingList) -> Result<EmailingList> {
        let sql = "INSERT INTO emailing_lists (name, emails) VALUES (?, ?)";
        let id = match self.pool.backend() {
            Backend::Sqlite(p) => sqlx::query(sql)
                .bind(&list.name)
                .bind(&list.emails)
                .execute(p)
                .await
                .context("Failed to create emailing list")?
                .last_insert_rowid(),
            Backend::Mysql(p) => sqlx::query(sql)
                .bind(&list.name)
                .bind(&list.emails)
                .execute(p)
                .await
                .context("Failed to create emailing list")?
                .last_insert_id() as i64,
        };

        Ok(EmailingList {
            id,
            ..list.clone()
        })
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<EmailingList>> {
        let sql = "SELECT id, name, emails FROM emailing_lists WHERE name = ?";
        let mut lists = match self.pool.backend() {
            Backend::Sqlite(p) => fetch_lists_sqlite(p, sql, name).await?,
            Backend::Mysql(p) => fetch_lists_mysql(p, sql, name).await?,
        };
        Ok(lists.pop())
    }

    async fn update_emails(&self, id: i64, emails: &str) -> Result<()> {
        let sql = "UPDATE emailing_lists SET emails = ? WHERE id = ?";
        match self.pool.backend() {
            Backend::Sqlite(p) => {
                sqlx::query(sql)
                    .bind(emails)
                    .bind(id)
                    .execute(p)
                    .await
                    .context("Failed to update emailing list")?;
            }
            Backend::Mysql(p) => {
                sqlx::query(sql)
                    .bind(emails)
                    .bind(id)
                    .execute(p)
                    .await
                    .context("Failed to update emailing list")?;
            }
        }
        Ok(())
    }
}

async fn fetch_lists_sqlite(pool: &SqlitePool, sql: &str, name: &str) -> Result<Vec<EmailingList>> {
    let rows = sqlx::query(sql)
        .bind(name)
        .fetch_all(pool)
        .await
        .context("Failed to fetch emailing lists")?;

    Ok(rows
        .iter()
        .map(|row| EmailingList {
            id: row.get("id"),
            name: row.get("name"),
            emails: row.get("emails"),
        })
        .collect())
}

async fn fetch_lists_mysql(pool: &MySqlPool, sql: &str, name: &str) -> Result<Vec<EmailingList>> {
    let rows = sqlx::query(sql)
        .bind(name)
        .fetch_all(pool)
        .await
        .context("Failed to fetch emailing lists")?;

    Ok(rows
        .iter()
        .map(|row| EmailingList {
            id: row.get("id"),
            name: row.get("name"),
            emails: row.get("emails"),
        })
        .collect())
}
