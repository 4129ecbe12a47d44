//! Services layer - Business logic
//!
//! This module contains the business logic of the Folio content service.
//! Services are responsible for:
//! - Implementing business rules and permission checks
//! - Coordinating between repositories and cache
//! - Turning expected failures into `Outcome::Rejected`

pub mod category;
pub mod emailing_list;
pub mod message;
pub mod password;
pub mod policy;
pub mod post;
pub mod slug;
pub mod user;

pub use category::{CategoryService, CategoryServiceError};
pub use emailing_list::{EmailingListService, EmailingListServiceError};
pub use message::{MessageService, MessageServiceError};
pub use password::{hash_password, verify_password};
pub use policy::{can_create_post, can_publish_post, can_update_post, PostCheck, PostPolicy};
pub use post::{PostService, PostServiceError};
pub use slug::generate_slug;
pub use user::{AuthorService, UserService, UserServiceError};
