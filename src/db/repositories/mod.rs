//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the queries for a specific entity.

pub mod author;
pub mod category;
pub mod emailing_list;
pub mod message;
pub mod post;
pub mod user;

pub use author::{AuthorRepository, SqlxAuthorRepository};
pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use emailing_list::{EmailingListRepository, SqlxEmailingListRepository};
pub use message::{MessageRepository, SqlxMessageRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use user::{SqlxUserRepository, UserRepository};
