//! Post domain module
//!
//! Board posts, searched through the denormalized `post_records` view.

pub mod entity;
pub mod repository;

pub use entity::{Post, PostField, PostSearchMode, PostSortKey};
pub use repository::PostRepository;
