//! Slug derivation
//!
//! Slugs are lowercase, hyphen-separated and keep non-ASCII letters as they
//! are. Collisions are resolved by the post service, which appends a random
//! five digit suffix to the base produced here.

use crate::models::POST_SLUG_MAX_LEN;
use rand::Rng;

/// Slug used when the title has nothing slug-able in it
pub const FALLBACK_SLUG: &str = "post";

/// Length of `-NNNNN`
const SUFFIX_LEN: usize = 6;

/// Generate a URL-friendly slug from a title
///
/// Lowercases, turns ASCII punctuation and whitespace into hyphens, collapses
/// runs of hyphens and trims them from both ends.
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.to_lowercase().chars() {
        let keep = c.is_ascii_alphanumeric() || (!c.is_ascii() && c.is_alphanumeric());
        if keep {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Base slug for a post: its own slug if set, otherwise derived from the
/// title. Truncated so a collision suffix still fits the slug column.
pub fn slug_base(slug: &str, title: &str) -> String {
    let base = if slug.trim().is_empty() {
        generate_slug(title)
    } else {
        slug.trim().to_string()
    };

    let max = POST_SLUG_MAX_LEN - SUFFIX_LEN;
    let truncated: String = base.chars().take(max).collect();
    let truncated = truncated.trim_end_matches('-');

    if truncated.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        truncated.to_string()
    }
}

/// `base` followed by a random five digit suffix
pub fn with_random_suffix(base: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(10_000..=99_999);
    format!("{}-{}", base, suffix)
}
