//! Message repository
//!
//! Database operations for contact messages. Messages are append-only.

use crate::db::{Backend, DynDatabasePool};
use crate::models::{Message, MessageFilter};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const MESSAGE_COLUMNS: &str = "id, name, email, subject, message, created_at, ip_address";

/// Message repository trait
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Store a new message
    async fn create(&self, message: &Message) -> Result<Message>;

    /// Count messages created after `since` from the email or, when given,
    /// from the IP address
    async fn count_recent(
        &self,
        email: &str,
        ip_address: Option<&str>,
        since: DateTime<Utc>,
    ) -> Result<i64>;

    /// List messages newest first
    async fn list(&self, filter: &MessageFilter) -> Result<Vec<Message>>;
}

/// SQLx-based message repository implementation
pub struct SqlxMessageRepository {
    pool: DynDatabasePool,
}

impl SqlxMessageRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn MessageRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl MessageRepository for SqlxMessageRepository {
    async fn create(&self, message: &Message) -> Result<Message> {
        match self.pool.backend() {
            Backend::Sqlite(p) => create_message_sqlite(p, message).await,
            Backend::Mysql(p) => create_message_mysql(p, message).await,
        }
    }

    async fn count_recent(
        &self,
        email: &str,
        ip_address: Option<&str>,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        // `ip_address = NULL` never matches, so a missing IP counts by email only.
        let sql = "SELECT COUNT(*) AS count FROM messages WHERE created_at > ? AND (email = ? OR ip_address = ?)";
        let count: i64 = match self.pool.backend() {
            Backend::Sqlite(p) => sqlx::query(sql)
                .bind(since)
                .bind(email)
                .bind(ip_address)
                .fetch_one(p)
                .await
                .context("Failed to count recent messages")?
                .get("count"),
            Backend::Mysql(p) => sqlx::query(sql)
                .bind(since)
                .bind(email)
                .bind(ip_address)
                .fetch_one(p)
                .await
                .context("Failed to count recent messages")?
                .get("count"),
        };
        Ok(count)
    }

    async fn list(&self, filter: &MessageFilter) -> Result<Vec<Message>> {
        let mut conditions = Vec::new();
        let mut args: Vec<&str> = Vec::new();
        if let Some(email) = filter.email.as_deref() {
            conditions.push("email = ?");
            args.push(email);
        }
        if let Some(ip) = filter.ip_address.as_deref() {
            conditions.push("ip_address = ?");
            args.push(ip);
        }

        let where_sql = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM messages{} ORDER BY created_at DESC, id DESC",
            MESSAGE_COLUMNS, where_sql
        );

        match self.pool.backend() {
            Backend::Sqlite(p) => list_messages_sqlite(p, &sql, &args).await,
            Backend::Mysql(p) => list_messages_mysql(p, &sql, &args).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_message_sqlite(pool: &SqlitePool, message: &Message) -> Result<Message> {
    let result = sqlx::query(
        "INSERT INTO messages (name, email, subject, message, created_at, ip_address) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&message.name)
    .bind(&message.email)
    .bind(&message.subject)
    .bind(&message.message)
    .bind(message.created_at)
    .bind(&message.ip_address)
    .execute(pool)
    .await
    .context("Failed to create message")?;

    Ok(Message {
        id: result.last_insert_rowid(),
        ..message.clone()
    })
}

async fn list_messages_sqlite(pool: &SqlitePool, sql: &str, args: &[&str]) -> Result<Vec<Message>> {
    let mut query = sqlx::query(sql);
    for arg in args {
        query = query.bind(*arg);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list messages")?;

    Ok(rows
        .iter()
        .map(|row| Message {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            subject: row.get("subject"),
            message: row.get("message"),
            created_at: row.get("created_at"),
            ip_address: row.get("ip_address"),
        })
        .collect())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_message_mysql(pool: &MySqlPool, message: &Message) -> Result<Message> {
    let result = sqlx::query(
        "INSERT INTO messages (name, email, subject, message, created_at, ip_address) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&message.name)
    .bind(&message.email)
    .bind(&message.subject)
    .bind(&message.message)
    .bind(message.created_at)
    .bind(&message.ip_address)
    .execute(pool)
    .await
    .context("Failed to create message")?;

    Ok(Message {
        id: result.last_insert_id() as i64,
        ..message.clone()
    })
}

async fn list_messages_mysql(pool: &MySqlPool, sql: &str, args: &[&str]) -> Result<Vec<Message>> {
    let mut query = sqlx::query(sql);
    for arg in args {
        query = query.bind(*arg);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list messages")?;

    Ok(rows
        .iter()
        .map(|row| Message {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            subject: row.get("subject"),
            message: row.get("message"),
            created_at: row.get("created_at"),
            ip_address: row.get("ip_address"),
        })
        .collect())
}
