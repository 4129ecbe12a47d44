//! Post model
//!
//! This module provides:
//! - `Post` entity representing a blog post
//! - `ThumbnailCrop` for the thumbnail region cut from the post image
//! - `PostFilter` for list queries
//! - Pagination types for list queries
//!
//! A post with no `published_at` is a draft. A post whose `published_at` lies
//! in the future is scheduled. Neither shows up in public listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum title length
pub const POST_TITLE_MAX_LEN: usize = 256;

/// Maximum slug length
pub const POST_SLUG_MAX_LEN: usize = 256;

/// Maximum length of the free-text tags field
pub const POST_TAGS_MAX_LEN: usize = 256;

/// Post entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    /// Unique identifier, 0 until persisted
    pub id: i64,
    /// Post title
    pub title: String,
    /// URL-friendly slug, empty until assigned
    pub slug: String,
    /// Teaser shown in listings
    pub short_description: String,
    /// Rich-text (HTML) body
    pub content: String,
    /// Category ID
    pub category_id: i64,
    /// Free-text tags
    #[serde(default)]
    pub tags: String,
    /// Post image reference
    #[serde(default)]
    pub image: Option<String>,
    /// Thumbnail crop region inside `image`
    #[serde(default)]
    pub thumbnail: Option<ThumbnailCrop>,
    /// Author ID, bound on create
    pub author_id: i64,
    /// Creation timestamp, stamped once on create
    pub created_at: DateTime<Utc>,
    /// Publication timestamp
    pub published_at: Option<DateTime<Utc>>,
    /// Last update or publish timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Create a new, unsaved draft post
    pub fn new(
        title: String,
        short_description: String,
        content: String,
        category_id: i64,
    ) -> Self {
        Self {
            id: 0, // Will be set by database
            title,
            slug: String::new(),
            short_description,
            content,
            category_id,
            tags: String::new(),
            image: None,
            thumbnail: None,
            author_id: 0,
            created_at: Utc::now(),
            published_at: None,
            updated_at: None,
        }
    }

    /// Use an explicit slug as the base instead of the title
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    /// Set the image and its thumbnail crop region
    pub fn with_image(mut self, image: impl Into<String>, thumbnail: Option<ThumbnailCrop>) -> Self {
        self.image = Some(image.into());
        self.thumbnail = thumbnail;
        self
    }

    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    /// Check whether the post has been stored
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    /// Check whether the post is visible at `now`
    pub fn is_published_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.published_at, Some(at) if at <= now)
    }

    pub fn is_draft(&self) -> bool {
        self.published_at.is_none()
    }

    /// Split the free-text tags on commas, trimming blanks
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Rectangular region of the post image used as its thumbnail.
///
/// The region keeps the 360x240 thumbnail aspect ratio and is stored as
/// `x1,y1,x2,y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailCrop {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl ThumbnailCrop {
    /// Thumbnail width in pixels
    pub const WIDTH: u32 = 360;
    /// Thumbnail height in pixels
    pub const HEIGHT: u32 = 240;

    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Largest centered region of a `width` x `height` image with the
    /// thumbnail aspect ratio.
    pub fn centered(width: u32, height: u32) -> Self {
        let (w, h) = (u64::from(width), u64::from(height));
        let (rw, rh) = (u64::from(Self::WIDTH), u64::from(Self::HEIGHT));

        let (crop_w, crop_h) = if w * rh > h * rw {
            (h * rw / rh, h)
        } else {
            (w, w * rh / rw)
        };

        let x1 = (w - crop_w) / 2;
        let y1 = (h - crop_h) / 2;

        // Each value is bounded by the u32 image dimensions.
        Self {
            x1: x1 as u32,
            y1: y1 as u32,
            x2: (x1 + crop_w) as u32,
            y2: (y1 + crop_h) as u32,
        }
    }

    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }
}

impl fmt::Display for ThumbnailCrop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x1, self.y1, self.x2, self.y2)
    }
}

impl FromStr for ThumbnailCrop {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid thumbnail crop '{}': {}", s, e))?;

        match parts.as_slice() {
            [x1, y1, x2, y2] if x1 <= x2 && y1 <= y2 => Ok(Self::new(*x1, *y1, *x2, *y2)),
            _ => Err(anyhow::anyhow!("Invalid thumbnail crop: {}", s)),
        }
    }
}

/// Filters for post list queries. Unset fields don't restrict.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostFilter {
    pub category_id: Option<i64>,
    pub author_id: Option<i64>,
    /// Substring of the free-text tags
    pub tag: Option<String>,
    /// Substring of the title
    pub title_contains: Option<String>,
}

impl PostFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_author(mut self, author_id: i64) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_title_contains(mut self, text: impl Into<String>) -> Self {
        self.title_contains = Some(text.into());
        self
    }
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 || self.total <= 0 {
            return 0;
        }
        let per_page = i64::from(self.per_page);
        ((self.total + per_page - 1) / per_page) as u32
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_post_new_is_unsaved_draft() {
        let post = Post::new(
            "Hello".to_string(),
            "Short".to_string(),
            "<p>Body</p>".to_string(),
            1,
        );

        assert_eq!(post.id, 0);
        assert!(!post.is_persisted());
        assert!(post.slug.is_empty());
        assert!(post.is_draft());
        assert!(post.updated_at.is_none());
    }

    #[test]
    fn test_post_is_published_at() {
        let now = Utc::now();
        let draft = Post::new("a".into(), "".into(), "".into(), 1);
        let past = draft.clone().with_published_at(now - Duration::hours(1));
        let future = draft.clone().with_published_at(now + Duration::hours(1));

        assert!(!draft.is_published_at(now));
        assert!(past.is_published_at(now));
        assert!(!future.is_published_at(now));
    }

    #[test]
    fn test_tag_list() {
        let post = Post::new("a".into(), "".into(), "".into(), 1).with_tags("rust, web,, sqlx ");
        assert_eq!(post.tag_list(), vec!["rust", "web", "sqlx"]);
    }

    #[test]
    fn test_thumbnail_crop_text_form() {
        let crop = ThumbnailCrop::new(10, 20, 370, 260);
        assert_eq!(crop.to_string(), "10,20,370,260");
        assert_eq!("10,20,370,260".parse::<ThumbnailCrop>().unwrap(), crop);
        assert_eq!(" 0, 0 ,360,240".parse::<ThumbnailCrop>().unwrap().width(), 360);
    }

    #[test]
    fn test_thumbnail_crop_rejects_garbage() {
        assert!("".parse::<ThumbnailCrop>().is_err());
        assert!("1,2,3".parse::<ThumbnailCrop>().is_err());
        assert!("a,b,c,d".parse::<ThumbnailCrop>().is_err());
        assert!("100,0,10,10".parse::<ThumbnailCrop>().is_err());
    }

    #[test]
    fn test_thumbnail_crop_centered() {
        // Wide image: full height, centered horizontally.
        let wide = ThumbnailCrop::centered(1200, 400);
        assert_eq!(wide, ThumbnailCrop::new(300, 0, 900, 400));

        // Tall image: full width, centered vertically.
        let tall = ThumbnailCrop::centered(360, 1000);
        assert_eq!(tall, ThumbnailCrop::new(0, 380, 360, 620));

        // Exact ratio covers the whole image.
        assert_eq!(ThumbnailCrop::centered(720, 480), ThumbnailCrop::new(0, 0, 720, 480));
    }

    #[test]
    fn test_list_params() {
        let params = ListParams::new(0, 500);
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 100);
        assert_eq!(ListParams::new(3, 10).offset(), 20);
    }

    #[test]
    fn test_paged_result_pages() {
        let params = ListParams::new(1, 10);
        let result = PagedResult::new(vec![1, 2, 3], 25, &params);
        assert_eq!(result.total_pages(), 3);
        assert!(result.has_next());
        assert!(!result.has_prev());

        let empty: PagedResult<i32> = PagedResult::new(vec![], 0, &params);
        assert_eq!(empty.total_pages(), 0);
        assert!(empty.is_empty());
    }
}
