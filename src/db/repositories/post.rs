//! Post repository
//!
//! Database operations for posts.
//!
//! This module provides:
//! - `PostRepository` trait defining the interface for post data access
//! - `SqlxPostRepository` implementing the trait for SQLite and MySQL
//!
//! Listings use the default post ordering: published posts newest first,
//! drafts last, ties broken by newest creation.

use crate::db::{Backend, DynDatabasePool};
use crate::models::{Post, PostFilter, ThumbnailCrop};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const POST_COLUMNS: &str = "id, title, slug, short_description, content, category_id, tags, image, thumbnail, author_id, created_at, published_at, updated_at";

const POST_ORDER: &str = "ORDER BY published_at IS NULL, published_at DESC, created_at DESC, id DESC";

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a new post, returning it with its ID
    async fn create(&self, post: &Post) -> Result<Post>;

    /// Write every column except `created_at`
    async fn update(&self, post: &Post) -> Result<()>;

    /// Get post by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Get post by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>>;

    /// Check if a slug already exists
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// List posts matching the filter.
    ///
    /// With `published_before` set, only posts published at or before that
    /// instant are returned.
    async fn list(
        &self,
        published_before: Option<DateTime<Utc>>,
        filter: &PostFilter,
    ) -> Result<Vec<Post>>;

    /// List one page of posts matching the filter
    async fn list_paged(
        &self,
        published_before: Option<DateTime<Utc>>,
        filter: &PostFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>>;

    /// Count posts matching the filter
    async fn count(
        &self,
        published_before: Option<DateTime<Utc>>,
        filter: &PostFilter,
    ) -> Result<i64>;
}

/// SQLx-based post repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    /// Create a new SQLx post repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post) -> Result<Post> {
        match self.pool.backend() {
            Backend::Sqlite(p) => create_post_sqlite(p, post).await,
            Backend::Mysql(p) => create_post_mysql(p, post).await,
        }
    }

    async fn update(&self, post: &Post) -> Result<()> {
        match self.pool.backend() {
            Backend::Sqlite(p) => update_post_sqlite(p, post).await,
            Backend::Mysql(p) => update_post_mysql(p, post).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let sql = format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS);
        let args = [QueryArg::Int(id)];
        let mut posts = match self.pool.backend() {
            Backend::Sqlite(p) => fetch_posts_sqlite(p, &sql, &args).await?,
            Backend::Mysql(p) => fetch_posts_mysql(p, &sql, &args).await?,
        };
        Ok(posts.pop())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let sql = format!("SELECT {} FROM posts WHERE slug = ?", POST_COLUMNS);
        let args = [QueryArg::Text(slug.to_string())];
        let mut posts = match self.pool.backend() {
            Backend::Sqlite(p) => fetch_posts_sqlite(p, &sql, &args).await?,
            Backend::Mysql(p) => fetch_posts_mysql(p, &sql, &args).await?,
        };
        Ok(posts.pop())
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let sql = "SELECT COUNT(*) AS count FROM posts WHERE slug = ?";
        let args = [QueryArg::Text(slug.to_string())];
        let count = match self.pool.backend() {
            Backend::Sqlite(p) => count_posts_sqlite(p, sql, &args).await?,
            Backend::Mysql(p) => count_posts_mysql(p, sql, &args).await?,
        };
        Ok(count > 0)
    }

    async fn list(
        &self,
        published_before: Option<DateTime<Utc>>,
        filter: &PostFilter,
    ) -> Result<Vec<Post>> {
        let (where_sql, args) = post_where_clause(published_before, filter);
        let sql = format!("SELECT {} FROM posts{} {}", POST_COLUMNS, where_sql, POST_ORDER);
        match self.pool.backend() {
            Backend::Sqlite(p) => fetch_posts_sqlite(p, &sql, &args).await,
            Backend::Mysql(p) => fetch_posts_mysql(p, &sql, &args).await,
        }
    }

    async fn list_paged(
        &self,
        published_before: Option<DateTime<Utc>>,
        filter: &PostFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let (where_sql, mut args) = post_where_clause(published_before, filter);
        let sql = format!(
            "SELECT {} FROM posts{} {} LIMIT ? OFFSET ?",
            POST_COLUMNS, where_sql, POST_ORDER
        );
        args.push(QueryArg::Int(limit));
        args.push(QueryArg::Int(offset));
        match self.pool.backend() {
            Backend::Sqlite(p) => fetch_posts_sqlite(p, &sql, &args).await,
            Backend::Mysql(p) => fetch_posts_mysql(p, &sql, &args).await,
        }
    }

    async fn count(
        &self,
        published_before: Option<DateTime<Utc>>,
        filter: &PostFilter,
    ) -> Result<i64> {
        let (where_sql, args) = post_where_clause(published_before, filter);
        let sql = format!("SELECT COUNT(*) AS count FROM posts{}", where_sql);
        match self.pool.backend() {
            Backend::Sqlite(p) => count_posts_sqlite(p, &sql, &args).await,
            Backend::Mysql(p) => count_posts_mysql(p, &sql, &args).await,
        }
    }
}

// ============================================================================
// Query building
// ============================================================================

/// A positional argument for a dynamically built query
#[derive(Debug, Clone, PartialEq)]
enum QueryArg {
    Int(i64),
    Text(String),
    Time(DateTime<Utc>),
}

/// Build the WHERE clause (with leading space, or empty) and its arguments
fn post_where_clause(
    published_before: Option<DateTime<Utc>>,
    filter: &PostFilter,
) -> (String, Vec<QueryArg>) {
    let mut conditions: Vec<&str> = Vec::new();
    let mut args = Vec::new();

    if let Some(now) = published_before {
        conditions.push("published_at IS NOT NULL AND published_at <= ?");
        args.push(QueryArg::Time(now));
    }
    if let Some(category_id) = filter.category_id {
        conditions.push("category_id = ?");
        args.push(QueryArg::Int(category_id));
    }
    if let Some(author_id) = filter.author_id {
        conditions.push("author_id = ?");
        args.push(QueryArg::Int(author_id));
    }
    if let Some(tag) = filter.tag.as_deref() {
        conditions.push("tags LIKE ? ESCAPE '!'");
        args.push(QueryArg::Text(like_pattern(tag)));
    }
    if let Some(title) = filter.title_contains.as_deref() {
        conditions.push("title LIKE ? ESCAPE '!'");
        args.push(QueryArg::Text(like_pattern(title)));
    }

    if conditions.is_empty() {
        (String::new(), args)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), args)
    }
}

/// Substring pattern with LIKE wildcards escaped
fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '!' | '%' | '_') {
            escaped.push('!');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn thumbnail_to_db(post: &Post) -> Option<String> {
    post.thumbnail.map(|t| t.to_string())
}

fn thumbnail_from_db(value: Option<String>) -> Result<Option<ThumbnailCrop>> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<ThumbnailCrop>())
        .transpose()
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_post_sqlite(pool: &SqlitePool, post: &Post) -> Result<Post> {
    let result = sqlx::query(
        r#"
        INSERT INTO posts (title, slug, short_description, content, category_id, tags, image, thumbnail, author_id, created_at, published_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&post.title)
    .bind(&post.slug)
    .bind(&post.short_description)
    .bind(&post.content)
    .bind(post.category_id)
    .bind(&post.tags)
    .bind(&post.image)
    .bind(thumbnail_to_db(post))
    .bind(post.author_id)
    .bind(post.created_at)
    .bind(post.published_at)
    .bind(post.updated_at)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    Ok(Post {
        id: result.last_insert_rowid(),
        ..post.clone()
    })
}

async fn update_post_sqlite(pool: &SqlitePool, post: &Post) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE posts
        SET title = ?, slug = ?, short_description = ?, content = ?, category_id = ?, tags = ?,
            image = ?, thumbnail = ?, author_id = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&post.title)
    .bind(&post.slug)
    .bind(&post.short_description)
    .bind(&post.content)
    .bind(post.category_id)
    .bind(&post.tags)
    .bind(&post.image)
    .bind(thumbnail_to_db(post))
    .bind(post.author_id)
    .bind(post.published_at)
    .bind(post.updated_at)
    .bind(post.id)
    .execute(pool)
    .await
    .context("Failed to update post")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("Post not found: {}", post.id);
    }
    Ok(())
}

async fn fetch_posts_sqlite(pool: &SqlitePool, sql: &str, args: &[QueryArg]) -> Result<Vec<Post>> {
    let mut query = sqlx::query(sql);
    for arg in args {
        query = match arg {
            QueryArg::Int(v) => query.bind(*v),
            QueryArg::Text(v) => query.bind(v.as_str()),
            QueryArg::Time(v) => query.bind(*v),
        };
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to fetch posts")?;

    rows.iter().map(row_to_post_sqlite).collect()
}

async fn count_posts_sqlite(pool: &SqlitePool, sql: &str, args: &[QueryArg]) -> Result<i64> {
    let mut query = sqlx::query(sql);
    for arg in args {
        query = match arg {
            QueryArg::Int(v) => query.bind(*v),
            QueryArg::Text(v) => query.bind(v.as_str()),
            QueryArg::Time(v) => query.bind(*v),
        };
    }

    let row = query
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?;

    Ok(row.get("count"))
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
    Ok(Post {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        short_description: row.get("short_description"),
        content: row.get("content"),
        category_id: row.get("category_id"),
        tags: row.get("tags"),
        image: row.get("image"),
        thumbnail: thumbnail_from_db(row.get("thumbnail"))?,
        author_id: row.get("author_id"),
        created_at: row.get("created_at"),
        published_at: row.get("published_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_post_mysql(pool: &MySqlPool, post: &Post) -> Result<Post> {
    let result = sqlx::query(
        r#"
        INSERT INTO posts (title, slug, short_description, content, category_id, tags, image, thumbnail, author_id, created_at, published_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&post.title)
    .bind(&post.slug)
    .bind(&post.short_description)
    .bind(&post.content)
    .bind(post.category_id)
    .bind(&post.tags)
    .bind(&post.image)
    .bind(thumbnail_to_db(post))
    .bind(post.author_id)
    .bind(post.created_at)
    .bind(post.published_at)
    .bind(post.updated_at)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    Ok(Post {
        id: result.last_insert_id() as i64,
        ..post.clone()
    })
}

async fn update_post_mysql(pool: &MySqlPool, post: &Post) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE posts
        SET title = ?, slug = ?, short_description = ?, content = ?, category_id = ?, tags = ?,
            image = ?, thumbnail = ?, author_id = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&post.title)
    .bind(&post.slug)
    .bind(&post.short_description)
    .bind(&post.content)
    .bind(post.category_id)
    .bind(&post.tags)
    .bind(&post.image)
    .bind(thumbnail_to_db(post))
    .bind(post.author_id)
    .bind(post.published_at)
    .bind(post.updated_at)
    .bind(post.id)
    .execute(pool)
    .await
    .context("Failed to update post")?;

    // MySQL reports matched-but-unchanged rows as 0 affected.
    if result.rows_affected() == 0 {
        let exists: i64 = sqlx::query("SELECT COUNT(*) AS count FROM posts WHERE id = ?")
            .bind(post.id)
            .fetch_one(pool)
            .await
            .context("Failed to check post")?
            .get("count");
        if exists == 0 {
            anyhow::bail!("Post not found: {}", post.id);
        }
    }
    Ok(())
}

async fn fetch_posts_mysql(pool: &MySqlPool, sql: &str, args: &[QueryArg]) -> Result<Vec<Post>> {
    let mut query = sqlx::query(sql);
    for arg in args {
        query = match arg {
            QueryArg::Int(v) => query.bind(*v),
            QueryArg::Text(v) => query.bind(v.as_str()),
            QueryArg::Time(v) => query.bind(*v),
        };
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to fetch posts")?;

    rows.iter().map(row_to_post_mysql).collect()
}

async fn count_posts_mysql(pool: &MySqlPool, sql: &str, args: &[QueryArg]) -> Result<i64> {
    let mut query = sqlx::query(sql);
    for arg in args {
        query = match arg {
            QueryArg::Int(v) => query.bind(*v),
            QueryArg::Text(v) => query.bind(v.as_str()),
            QueryArg::Time(v) => query.bind(*v),
        };
    }

    let row = query
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?;

    Ok(row.get("count"))
}

fn row_to_post_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Post> {
    Ok(Post {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        short_description: row.get("short_description"),
        content: row.get("content"),
        category_id: row.get("category_id"),
        tags: row.get("tags"),
        image: row.get("image"),
        thumbnail: thumbnail_from_db(row.get("thumbnail"))?,
        author_id: row.get("author_id"),
        created_at: row.get("created_at"),
        published_at: row.get("published_at"),
        updated_at: row.get("updated_at"),
    })
}
