//! Post permission policy
//!
//! Every mutating post operation asks a pure predicate over the acting
//! identity and the post before touching storage. The predicates are plain
//! functions so a service can be built with different rules.

use crate::models::{Actor, Post, Rejection, PERM_PUBLISH_POST};

/// Denial message for `create`
pub const CREATE_DENIED: &str = "You don't have the necessary permissions to create a post";
/// Denial message for `update`
pub const UPDATE_DENIED: &str = "You don't have the necessary permissions to update this post";
/// Denial message for `publish`
pub const PUBLISH_DENIED: &str = "You don't have the required permissions to publish this post";

/// Predicate deciding whether an actor may perform an operation on a post
pub type PostCheck = fn(&Actor, &Post) -> Result<(), Rejection>;

/// The checks applied by the post service
#[derive(Clone, Copy)]
pub struct PostPolicy {
    pub create: PostCheck,
    pub update: PostCheck,
    pub publish: PostCheck,
}

impl std::fmt::Debug for PostPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostPolicy").finish_non_exhaustive()
    }
}

impl Default for PostPolicy {
    fn default() -> Self {
        Self {
            create: can_create_post,
            update: can_update_post,
            publish: can_publish_post,
        }
    }
}

/// Only actors with an author identity may create posts.
pub fn can_create_post(actor: &Actor, _post: &Post) -> Result<(), Rejection> {
    if actor.is_author() {
        Ok(())
    } else {
        Err(Rejection::permission_denied(CREATE_DENIED))
    }
}

/// Only the post's own author may update it.
pub fn can_update_post(actor: &Actor, post: &Post) -> Result<(), Rejection> {
    match actor.author_id() {
        Some(author_id) if author_id == post.author_id => Ok(()),
        _ => Err(Rejection::permission_denied(UPDATE_DENIED)),
    }
}

/// Publishing needs the `can_publish_post` permission, authorship is not required.
pub fn can_publish_post(actor: &Actor, _post: &Post) -> Result<(), Rejection> {
    if actor.has_perm(PERM_PUBLISH_POST) {
        Ok(())
    } else {
        Err(Rejection::permission_denied(PUBLISH_DENIED))
    }
}
