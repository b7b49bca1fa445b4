//! Sift Core Library
//!
//! This crate provides the core functionality for Sift, including:
//! - Query core (sort registry, predicate builder, paginator, search facade)
//! - Searchable records (members, posts) and their repositories
//! - Storage (SQLite pool + versioned migrations)
//! - Configuration and error types

pub mod config;
pub mod domain;
pub mod error;
pub mod query;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::{
        Member, MemberRepository, MemberSearchMode, Post, PostRepository, PostSearchMode,
        SearchRepository,
    };
    pub use crate::error::{Error, Result};
    pub use crate::query::{Page, QueryOptions, SearchDefaults, SearchParams, SortDirective};
    pub use crate::storage::{Database, DatabaseConfig};
}
