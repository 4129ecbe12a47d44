//! Post service
//!
//! Implements the post lifecycle:
//! - Unique slug assignment with random suffix retries
//! - Create, update and publish behind the `PostPolicy` checks
//! - Public and full listings, filtered and paged
//! - Read-through cache for single post lookups
//!
//! `create`, `update` and `publish` work on the caller's in-memory `Post`:
//! edits are applied to it first, the service authorizes, stamps and persists.

use crate::cache::{CacheLayer, MemoryCache};
use crate::db::is_unique_violation;
use crate::db::repositories::PostRepository;
use crate::models::{
    Actor, ListParams, Outcome, PagedResult, Post, PostFilter, Rejection, POST_TAGS_MAX_LEN,
    POST_TITLE_MAX_LEN,
};
use crate::services::policy::{PostPolicy, CREATE_DENIED};
use crate::services::slug::{slug_base, with_random_suffix};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// Default cache TTL for single posts (1 hour)
const POST_CACHE_TTL_SECS: u64 = 3600;

/// Cache key prefixes
const CACHE_KEY_POST_BY_ID: &str = "post:id:";
const CACHE_KEY_POST_BY_SLUG: &str = "post:slug:";

pub const CREATE_OK: &str = "The post has been successfully inserted.";
pub const UPDATE_OK: &str = "The post has been successfully updated.";
pub const PUBLISH_OK: &str = "The post has been successfully published.";

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    /// Post not found
    #[error("Post not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Another post took the slug between the lookup and the insert.
    /// Retrying the whole operation picks a fresh slug.
    #[error("Post slug already exists: {0}")]
    DuplicateSlug(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Post service
pub struct PostService {
    repo: Arc<dyn PostRepository>,
    cache: Arc<MemoryCache>,
    cache_ttl: Duration,
    policy: PostPolicy,
}

impl PostService {
    /// Create a new post service with the default policy
    pub fn new(repo: Arc<dyn PostRepository>, cache: Arc<MemoryCache>) -> Self {
        Self {
            repo,
            cache,
            cache_ttl: Duration::from_secs(POST_CACHE_TTL_SECS),
            policy: PostPolicy::default(),
        }
    }

    /// Use a custom cache TTL for single posts
    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    /// Replace the permission checks
    pub fn with_policy(mut self, policy: PostPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Assign a slug that no stored post uses.
    ///
    /// The base is the post's own slug, or the slugified title when it has
    /// none. While the candidate is taken, a random five digit suffix is
    /// appended to the base and the lookup repeated.
    pub async fn set_slug(&self, post: &mut Post) -> Result<(), PostServiceError> {
        let base = slug_base(&post.slug, &post.title);
        let mut candidate = base.clone();

        while self.repo.exists_by_slug(&candidate).await? {
            tracing::debug!("Slug '{}' is taken, retrying with a suffix", candidate);
            candidate = with_random_suffix(&base);
        }

        post.slug = candidate;
        Ok(())
    }

    /// Create a post authored by `actor`.
    ///
    /// On success the post carries its ID, slug, author and creation time.
    pub async fn create(&self, actor: &Actor, post: &mut Post) -> Result<Outcome<()>, PostServiceError> {
        if let Err(rejection) = (self.policy.create)(actor, post) {
            tracing::warn!("User {} was refused post creation", actor.user.username);
            return Ok(rejection.into());
        }
        // A custom policy may let through an actor with nobody to bind as author.
        let Some(author_id) = actor.author_id() else {
            tracing::warn!("User {} has no author identity", actor.user.username);
            return Ok(Rejection::permission_denied(CREATE_DENIED).into());
        };

        Self::validate(post)?;
        self.set_slug(post).await?;
        post.author_id = author_id;
        post.created_at = Utc::now();

        let created = self
            .repo
            .create(post)
            .await
            .map_err(|e| Self::map_write_error(e, &post.slug))?;
        post.id = created.id;

        tracing::info!("Post {} created with slug '{}'", post.id, post.slug);
        Ok(Outcome::success((), CREATE_OK))
    }

    /// Persist edits made to a stored post. Only its author may do this.
    ///
    /// `created_at` is never written and is restored from storage.
    pub async fn update(&self, actor: &Actor, post: &mut Post) -> Result<Outcome<()>, PostServiceError> {
        let stored = self.stored(post).await?;
        if let Err(rejection) = (self.policy.update)(actor, &stored) {
            tracing::warn!(
                "User {} was refused update of post {}",
                actor.user.username,
                post.id
            );
            return Ok(rejection.into());
        }

        Self::validate(post)?;
        self.save(post, &stored).await?;

        tracing::info!("Post {} updated", post.id);
        Ok(Outcome::success((), UPDATE_OK))
    }

    /// Publish a stored post. Needs the `can_publish_post` permission.
    ///
    /// Like `update` this stamps `updated_at` and persists. It does not touch
    /// `published_at`, which is set by the caller.
    pub async fn publish(&self, actor: &Actor, post: &mut Post) -> Result<Outcome<()>, PostServiceError> {
        let stored = self.stored(post).await?;
        if let Err(rejection) = (self.policy.publish)(actor, &stored) {
            tracing::warn!(
                "User {} was refused publishing post {}",
                actor.user.username,
                post.id
            );
            return Ok(rejection.into());
        }

        Self::validate(post)?;
        self.save(post, &stored).await?;

        tracing::info!("Post {} published", post.id);
        Ok(Outcome::success((), PUBLISH_OK))
    }

    /// List posts matching `filter` in the default order.
    ///
    /// Unless `show_unpublished` is set, drafts and posts scheduled for later
    /// are left out.
    pub async fn list(&self, show_unpublished: bool, filter: &PostFilter) -> Result<Vec<Post>, PostServiceError> {
        let published_before = (!show_unpublished).then(Utc::now);
        Ok(self.repo.list(published_before, filter).await?)
    }

    /// Paged variant of `list`
    pub async fn list_paged(
        &self,
        show_unpublished: bool,
        filter: &PostFilter,
        params: &ListParams,
    ) -> Result<PagedResult<Post>, PostServiceError> {
        let published_before = (!show_unpublished).then(Utc::now);
        let total = self.repo.count(published_before, filter).await?;
        let items = self
            .repo
            .list_paged(published_before, filter, params.offset(), params.limit())
            .await?;
        Ok(PagedResult::new(items, total, params))
    }

    /// Get a post by ID (cached)
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Post>, PostServiceError> {
        let cache_key = format!("{}{}", CACHE_KEY_POST_BY_ID, id);
        if let Some(post) = self.cache.get::<Post>(&cache_key).await.ok().flatten() {
            tracing::debug!("Cache hit for {}", cache_key);
            return Ok(Some(post));
        }

        let post = self.repo.get_by_id(id).await?;
        if let Some(ref found) = post {
            let _ = self.cache.set(&cache_key, found, self.cache_ttl).await;
        }
        Ok(post)
    }

    /// Get a post by slug (cached)
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>, PostServiceError> {
        let cache_key = format!("{}{}", CACHE_KEY_POST_BY_SLUG, slug);
        if let Some(post) = self.cache.get::<Post>(&cache_key).await.ok().flatten() {
            tracing::debug!("Cache hit for {}", cache_key);
            return Ok(Some(post));
        }

        let post = self.repo.get_by_slug(slug).await?;
        if let Some(ref found) = post {
            let _ = self.cache.set(&cache_key, found, self.cache_ttl).await;
        }
        Ok(post)
    }

    /// Previous and next posts in a series.
    ///
    /// Series navigation is not enabled, so there are never any neighbours.
    pub fn get_next_previous_posts(&self, _post: &Post) -> (Option<Post>, Option<Post>) {
        (None, None)
    }

    /// Load the stored version of an in-memory post
    async fn stored(&self, post: &Post) -> Result<Post, PostServiceError> {
        if !post.is_persisted() {
            return Err(PostServiceError::NotFound("post has not been created".to_string()));
        }
        self.repo
            .get_by_id(post.id)
            .await?
            .ok_or_else(|| PostServiceError::NotFound(post.id.to_string()))
    }

    /// Stamp `updated_at`, write, and drop cached copies
    async fn save(&self, post: &mut Post, stored: &Post) -> Result<(), PostServiceError> {
        post.created_at = stored.created_at;
        post.updated_at = Some(Utc::now());

        self.repo
            .update(post)
            .await
            .map_err(|e| Self::map_write_error(e, &post.slug))?;

        self.invalidate(post.id, &stored.slug).await;
        if post.slug != stored.slug {
            self.invalidate(post.id, &post.slug).await;
        }
        Ok(())
    }

    async fn invalidate(&self, id: i64, slug: &str) {
        let _ = self.cache.delete(&format!("{}{}", CACHE_KEY_POST_BY_ID, id)).await;
        let _ = self.cache.delete(&format!("{}{}", CACHE_KEY_POST_BY_SLUG, slug)).await;
    }

    fn validate(post: &Post) -> Result<(), PostServiceError> {
        if post.title.trim().is_empty() {
            return Err(PostServiceError::ValidationError("Title cannot be empty".to_string()));
        }
        if post.title.chars().count() > POST_TITLE_MAX_LEN {
            return Err(PostServiceError::ValidationError(format!(
                "Title cannot exceed {} characters",
                POST_TITLE_MAX_LEN
            )));
        }
        if post.tags.chars().count() > POST_TAGS_MAX_LEN {
            return Err(PostServiceError::ValidationError(format!(
                "Tags cannot exceed {} characters",
                POST_TAGS_MAX_LEN
            )));
        }
        Ok(())
    }

    fn map_write_error(err: anyhow::Error, slug: &str) -> PostServiceError {
        if is_unique_violation(&err) {
            PostServiceError::DuplicateSlug(slug.to_string())
        } else {
            PostServiceError::InternalError(err)
        }
    }
}
