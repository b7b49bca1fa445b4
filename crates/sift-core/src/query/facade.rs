//! Search facade
//!
//! Composes the sort registry, predicate builder and paginator into the
//! `search` operation each repository exposes, along with keyword counts and
//! id lookups over the same record type. Holds no per-call state.

use std::fmt;
use std::marker::PhantomData;

use sqlx::SqlitePool;

use super::page::{Page, PageRequest};
use super::paginator::{Paginator, QueryOptions};
use super::params::{SearchDefaults, SearchParams};
use super::predicate::PredicateBuilder;
use super::sort::{SortDirective, SortRegistry};
use super::Record;
use crate::error::Result;

/// Keyword search, sorting and pagination over one record type
pub struct QueryFacade<R: Record> {
    pool: SqlitePool,
    registry: SortRegistry<R::Field>,
    options: QueryOptions,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> QueryFacade<R> {
    /// Create a facade whose registry holds every `R::SortKey`
    pub fn new(pool: SqlitePool, options: QueryOptions) -> Self {
        Self {
            pool,
            registry: SortRegistry::for_keys::<R::SortKey>(R::PRIMARY_KEY),
            options,
            _record: PhantomData,
        }
    }

    pub fn registry(&self) -> &SortRegistry<R::Field> {
        &self.registry
    }

    /// Search `R` by keyword with a zero-based page window
    pub async fn search(
        &self,
        mode: R::Mode,
        keyword: &str,
        sort: &[SortDirective],
        page_index: u32,
        page_size: u32,
    ) -> Result<Page<R>> {
        let request = PageRequest::new(page_index, page_size)?;
        let order_by = self.registry.resolve_all(sort);
        let predicate = PredicateBuilder::build(mode, keyword);

        Paginator::new(&self.pool, self.options)
            .fetch::<R>(&predicate, &order_by, request)
            .await
    }

    /// Number of `R` the keyword matches under `mode`
    pub async fn count(&self, mode: R::Mode, keyword: &str) -> Result<u64> {
        let predicate = PredicateBuilder::build(mode, keyword);
        Paginator::new(&self.pool, self.options)
            .count::<R>(&predicate)
            .await
    }

    /// Whether the keyword matches any `R` under `mode`
    pub async fn exists(&self, mode: R::Mode, keyword: &str) -> Result<bool> {
        let predicate = PredicateBuilder::build(mode, keyword);
        Paginator::new(&self.pool, self.options)
            .exists::<R>(&predicate)
            .await
    }

    /// Records with the given primary keys, ascending by key
    pub async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<R>> {
        Paginator::new(&self.pool, self.options)
            .find_by_ids::<R>(ids)
            .await
    }

    /// Normalize raw boundary input, then search
    pub async fn search_params(
        &self,
        params: &SearchParams,
        defaults: &SearchDefaults,
    ) -> Result<Page<R>> {
        let request = params.normalize::<R::Mode>(&self.registry, defaults)?;
        self.search(
            request.mode,
            &request.keyword,
            &request.sort,
            request.page_index,
            request.page_size,
        )
        .await
    }
}

impl<R: Record> Clone for QueryFacade<R> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            registry: self.registry.clone(),
            options: self.options,
            _record: PhantomData,
        }
    }
}

impl<R: Record> fmt::Debug for QueryFacade<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryFacade")
            .field("source", &R::SOURCE)
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
