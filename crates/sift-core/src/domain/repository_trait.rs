//! Repository trait for paged keyword search
//!
//! Lets outer layers drive any searchable record type through one
//! object-safe interface.

use async_trait::async_trait;

use crate::error::Result;
use crate::query::{Page, Record, SearchDefaults, SearchParams};

/// Paged keyword search over one record type
#[async_trait]
pub trait SearchRepository: Send + Sync {
    type Record: Record;

    /// Normalize raw request input and run the search
    async fn search(
        &self,
        params: &SearchParams,
        defaults: &SearchDefaults,
    ) -> Result<Page<Self::Record>>;

    /// Total number of stored records
    async fn count(&self) -> Result<u64>;
}
