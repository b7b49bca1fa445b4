//! Member domain module
//!
//! Board members and their keyword search.
//!
//! # Architecture
//!
//! - **Entity**: `Member`
//! - **Search vocabulary**: `MemberSearchMode` (USERNAME, NICKNAME, ALL), `MemberSortKey`
//! - **Repository**: `MemberRepository` for persistence and paged search
//!
//! # Example
//!
//! ```ignore
//! use sift_core::domain::member::{MemberRepository, MemberSearchMode};
//! use sift_core::query::SortDirective;
//!
//! let repo = MemberRepository::new(pool.clone());
//! let page = repo
//!     .find_by_kw_paged(MemberSearchMode::Nickname, "kim", &[SortDirective::desc("id")], 0, 10)
//!     .await?;
//! ```

pub mod entity;
pub mod repository;

pub use entity::{Member, MemberField, MemberSearchMode, MemberSortKey};
pub use repository::MemberRepository;
