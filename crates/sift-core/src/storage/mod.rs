//! Storage layer - pooled SQLite
//!
//! Provides database management and migrations for sift.
//!
//! # Architecture
//!
//! - `database`: Connection pool management and initialization
//! - `migrations`: Schema versioning and automatic migration
//!
//! # Usage
//!
//! ```ignore
//! use sift_core::storage::{Database, DatabaseConfig};
//!
//! // Create an in-memory database for testing
//! let db = Database::in_memory().await?;
//!
//! // Or open a file database
//! let db = Database::new(DatabaseConfig::with_path("board.db")).await?;
//! ```

pub mod database;
pub mod migrations;

pub use database::{Database, DatabaseConfig, default_database_path, encode_timestamp};
pub use migrations::{CURRENT_VERSION, MigrationStatus, migration_status, run_migrations};
