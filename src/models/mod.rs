//! Data models
//!
//! This module contains the data structures used throughout the Folio content service.
//! Models represent:
//! - Database entities (User, Author, Category, Post, Message, EmailingList)
//! - Query filters and pagination types
//! - Business outcomes (`Outcome`, `Rejection`)

mod author;
mod category;
mod emailing_list;
mod message;
mod outcome;
mod post;
mod user;

pub use author::Author;
pub use category::{Category, CATEGORY_DESCRIPTION_MAX_LEN, CATEGORY_NAME_MAX_LEN};
pub use emailing_list::EmailingList;
pub use message::{
    Message, MessageFilter, MESSAGE_IP_MAX_LEN, MESSAGE_NAME_MAX_LEN, MESSAGE_SUBJECT_MAX_LEN,
};
pub use outcome::{Outcome, Rejection, RejectionKind};
pub use post::{
    ListParams, PagedResult, Post, PostFilter, ThumbnailCrop, POST_SLUG_MAX_LEN,
    POST_TAGS_MAX_LEN, POST_TITLE_MAX_LEN,
};
pub use user::{Actor, User, PERM_PUBLISH_POST, USERNAME_MAX_LEN};
