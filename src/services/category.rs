//! Category service
//!
//! Implements business logic for category management:
//! - Create with name and description length limits
//! - Lookup and alphabetical listing
//! - Posts of a category, unpublished included
//! - Restricted deletion while posts still reference the category

use crate::db::repositories::{CategoryRepository, PostRepository};
use crate::models::{Category, Post, PostFilter, CATEGORY_DESCRIPTION_MAX_LEN, CATEGORY_NAME_MAX_LEN};
use std::sync::Arc;

/// Error types for category service operations
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    /// Category not found
    #[error("Category not found: {0}")]
    NotFound(String),

    /// Posts still reference the category
    #[error("Category is used by {0} post(s)")]
    InUse(i64),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Category service for managing blog categories
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
    posts: Arc<dyn PostRepository>,
}

impl CategoryService {
    /// Create a new category service
    pub fn new(repo: Arc<dyn CategoryRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { repo, posts }
    }

    /// Create a new category
    ///
    /// # Errors
    /// - `ValidationError` if the name is empty, or the name or description
    ///   is over its length limit
    pub async fn create(&self, name: &str, description: &str) -> Result<Category, CategoryServiceError> {
        let name = name.trim();
        Self::validate(name, description)?;

        let category = self
            .repo
            .create(&Category::new(name.to_string(), description.to_string()))
            .await?;

        tracing::info!("Category {} '{}' created", category.id, category.name);
        Ok(category)
    }

    /// Get a category by ID
    pub async fn get(&self, id: i64) -> Result<Option<Category>, CategoryServiceError> {
        Ok(self.repo.get_by_id(id).await?)
    }

    /// All categories, by name
    pub async fn list(&self) -> Result<Vec<Category>, CategoryServiceError> {
        Ok(self.repo.list().await?)
    }

    /// Every post in the category, in the default post order
    pub async fn get_posts(&self, category: &Category) -> Result<Vec<Post>, CategoryServiceError> {
        let filter = PostFilter::new().with_category(category.id);
        Ok(self.posts.list(None, &filter).await?)
    }

    /// Delete a category that no post references
    ///
    /// # Errors
    /// - `InUse` while any post, draft or published, is in the category
    /// - `NotFound` if there is no such category
    pub async fn delete(&self, id: i64) -> Result<(), CategoryServiceError> {
        let in_use = self
            .posts
            .count(None, &PostFilter::new().with_category(id))
            .await?;
        if in_use > 0 {
            tracing::warn!("Refusing to delete category {}: {} post(s) use it", id, in_use);
            return Err(CategoryServiceError::InUse(in_use));
        }

        if self.repo.get_by_id(id).await?.is_none() {
            return Err(CategoryServiceError::NotFound(id.to_string()));
        }

        self.repo.delete(id).await?;
        tracing::info!("Category {} deleted", id);
        Ok(())
    }

    fn validate(name: &str, description: &str) -> Result<(), CategoryServiceError> {
        if name.is_empty() {
            return Err(CategoryServiceError::ValidationError(
                "Category name cannot be empty".to_string(),
            ));
        }
        if name.chars().count() > CATEGORY_NAME_MAX_LEN {
            return Err(CategoryServiceError::ValidationError(format!(
                "Category name cannot exceed {} characters",
                CATEGORY_NAME_MAX_LEN
            )));
        }
        if description.chars().count() > CATEGORY_DESCRIPTION_MAX_LEN {
            return Err(CategoryServiceError::ValidationError(format!(
                "Category description cannot exceed {} characters",
                CATEGORY_DESCRIPTION_MAX_LEN
            )));
        }
        Ok(())
    }
}
