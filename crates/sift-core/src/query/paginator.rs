//! Windowed fetch with total count
//!
//! Both reads run on one pooled connection inside one read transaction, so
//! `content` and `total_elements` always come from the same snapshot. The
//! transaction is dropped (rolled back, connection returned) on every error
//! or timeout path.

use std::time::Duration;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, warn};

use super::page::{Page, PageRequest};
use super::predicate::{MatchCase, Predicate};
use super::sort::OrderBy;
use super::{FieldRef, Record};
use crate::error::{Error, Result};

/// Default deadline for one fetch (+ count)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound ids per `IN (...)` list, well under SQLite's variable limit
const MAX_IDS_PER_QUERY: usize = 500;

/// Per-query execution options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Deadline covering connection acquisition, fetch and count
    pub timeout: Duration,
    pub match_case: MatchCase,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_QUERY_TIMEOUT,
            match_case: MatchCase::Sensitive,
        }
    }
}

impl QueryOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_match_case(mut self, match_case: MatchCase) -> Self {
        self.match_case = match_case;
        self
    }
}

/// Total derivable from the window alone, if any
///
/// A first page that came back short already holds every match, so the
/// count query is skipped. Any other page needs the count.
pub fn resolve_total(request: PageRequest, fetched: usize) -> Option<u64> {
    if request.page_index() == 0 && fetched < request.page_size() as usize {
        Some(fetched as u64)
    } else {
        None
    }
}

fn count_query<R: Record>(
    predicate: &Predicate<R::Field>,
    match_case: MatchCase,
) -> QueryBuilder<'static, Sqlite> {
    let mut count =
        QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {} WHERE ", R::SOURCE));
    predicate.push_sql(&mut count, match_case);
    count
}

/// Executes windowed reads against the pool
#[derive(Debug, Clone, Copy)]
pub struct Paginator<'a> {
    pool: &'a SqlitePool,
    options: QueryOptions,
}

impl<'a> Paginator<'a> {
    pub fn new(pool: &'a SqlitePool, options: QueryOptions) -> Self {
        Self { pool, options }
    }

    /// Fetch one page of `R` matching `predicate`, ordered by `order_by`
    pub async fn fetch<R: Record>(
        &self,
        predicate: &Predicate<R::Field>,
        order_by: &OrderBy<R::Field>,
        request: PageRequest,
    ) -> Result<Page<R>> {
        self.with_deadline(
            R::SOURCE,
            "search",
            self.fetch_in_snapshot(predicate, order_by, request),
        )
        .await
    }

    /// Number of `R` matching `predicate`
    pub async fn count<R: Record>(&self, predicate: &Predicate<R::Field>) -> Result<u64> {
        self.with_deadline(R::SOURCE, "count", async {
            let total: i64 = count_query::<R>(predicate, self.options.match_case)
                .build_query_scalar::<i64>()
                .fetch_one(self.pool)
                .await?;
            Ok::<_, Error>(u64::try_from(total).unwrap_or_default())
        })
        .await
    }

    /// Whether any `R` matches `predicate`; stops at the first row
    pub async fn exists<R: Record>(&self, predicate: &Predicate<R::Field>) -> Result<bool> {
        self.with_deadline(R::SOURCE, "exists", async {
            let mut select =
                QueryBuilder::<Sqlite>::new(format!("SELECT 1 FROM {} WHERE ", R::SOURCE));
            predicate.push_sql(&mut select, self.options.match_case);
            select.push(" LIMIT 1");

            let hit: Option<i64> = select
                .build_query_scalar::<i64>()
                .fetch_optional(self.pool)
                .await?;
            Ok::<_, Error>(hit.is_some())
        })
        .await
    }

    /// Every `R` whose primary key is in `ids`, ascending by key
    ///
    /// Duplicate and unknown ids are ignored. Large id lists are split into
    /// several `IN (...)` reads inside one read transaction.
    pub async fn find_by_ids<R: Record>(&self, ids: &[i64]) -> Result<Vec<R>> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.with_deadline(R::SOURCE, "find_by_ids", async {
            let key = R::PRIMARY_KEY.column();
            let mut tx = self.pool.begin().await?;
            let mut records = Vec::with_capacity(ids.len());

            // Chunks are ascending, so concatenated results stay ordered
            for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
                let mut select = QueryBuilder::<Sqlite>::new(format!(
                    "SELECT {} FROM {} WHERE {} IN (",
                    R::COLUMNS,
                    R::SOURCE,
                    key
                ));
                let mut separated = select.separated(", ");
                for id in chunk {
                    separated.push_bind(*id);
                }
                separated.push_unseparated(")");
                select.push(" ORDER BY ").push(key).push(" ASC");

                let rows: Vec<R> = select.build_query_as::<R>().fetch_all(&mut *tx).await?;
                records.extend(rows);
            }

            tx.commit().await?;
            debug!(
                source = R::SOURCE,
                requested = ids.len(),
                found = records.len(),
                "Records fetched by id"
            );
            Ok::<_, Error>(records)
        })
        .await
    }

    async fn with_deadline<T>(
        &self,
        source: &'static str,
        operation: &'static str,
        query: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.options.timeout, query).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    source,
                    operation,
                    timeout_ms = self.options.timeout.as_millis() as u64,
                    "Query timed out"
                );
                Err(Error::StorageTimeout(self.options.timeout))
            }
        }
    }

    async fn fetch_in_snapshot<R: Record>(
        &self,
        predicate: &Predicate<R::Field>,
        order_by: &OrderBy<R::Field>,
        request: PageRequest,
    ) -> Result<Page<R>> {
        let mut tx = self.pool.begin().await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM {} WHERE ",
            R::COLUMNS,
            R::SOURCE
        ));
        predicate.push_sql(&mut select, self.options.match_case);
        order_by.push_sql(&mut select);
        select
            .push(" LIMIT ")
            .push_bind(request.limit())
            .push(" OFFSET ")
            .push_bind(request.offset());

        let content: Vec<R> = select.build_query_as::<R>().fetch_all(&mut *tx).await?;

        let total_elements = match resolve_total(request, content.len()) {
            Some(total) => {
                debug!(source = R::SOURCE, total, "Short first page, count query skipped");
                total
            }
            None => {
                let total: i64 = count_query::<R>(predicate, self.options.match_case)
                    .build_query_scalar::<i64>()
                    .fetch_one(&mut *tx)
                    .await?;
                u64::try_from(total).unwrap_or_default()
            }
        };

        tx.commit().await?;

        debug!(
            source = R::SOURCE,
            page_index = request.page_index(),
            page_size = request.page_size(),
            returned = content.len(),
            total_elements,
            "Search page fetched"
        );

        Ok(Page::new(content, request, total_elements))
    }
}
