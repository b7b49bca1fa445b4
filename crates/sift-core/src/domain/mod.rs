//! Domain layer
//!
//! Searchable record types and their repositories.

pub mod member;
pub mod post;
pub mod repository_trait;

pub use member::{Member, MemberRepository, MemberSearchMode};
pub use post::{Post, PostRepository, PostSearchMode};
pub use repository_trait::SearchRepository;
