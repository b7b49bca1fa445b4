//! Search query core
//!
//! Turns a closed search mode, a free-text keyword and caller sort
//! directives into a bound, parameterized SQLite query, then executes it as
//! a windowed fetch plus (when needed) a total count.
//!
//! # Architecture
//!
//! - **SortRegistry** (`sort`): closed token → field mapping, unknown keys dropped
//! - **PredicateBuilder** (`predicate`): keyword containment expression trees
//! - **Paginator** (`paginator`): offset/limit fetch + count in one read snapshot
//! - **QueryFacade** (`facade`): the `search` operation each repository exposes
//! - **SearchParams** (`params`): raw 1-based request input → core tuple
//!
//! Data flows one way:
//!
//! ```text
//! SearchParams -> QueryFacade -> {SortRegistry, PredicateBuilder} -> Paginator -> Page<R>
//! ```
//!
//! Column names only ever come from the closed [`FieldRef`] enums of a
//! [`Record`]; keywords are always bound parameters.

pub mod facade;
pub mod page;
pub mod paginator;
pub mod params;
pub mod predicate;
pub mod sort;

use std::fmt::Debug;
use std::hash::Hash;
use std::str::FromStr;

use sqlx::FromRow;
use sqlx::sqlite::SqliteRow;

use crate::error::Error;

pub use facade::QueryFacade;
pub use page::{Page, PageRequest};
pub use paginator::{Paginator, QueryOptions, resolve_total};
pub use params::{SearchDefaults, SearchParams, SearchRequest};
pub use predicate::{MatchCase, Predicate, PredicateBuilder};
pub use sort::{Direction, OrderBy, OrderTerm, SortDirective, SortRegistry};

/// A typed reference to a storage column of one record type
pub trait FieldRef: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Column name in the record's source table or view
    fn column(self) -> &'static str;
}

/// Closed set of keyword search modes for one record type
pub trait SearchMode:
    Copy + Debug + Default + FromStr<Err = Error> + Send + Sync + 'static
{
    type Field: FieldRef;

    /// Fields the keyword is matched against; a record matches if any does
    fn fields(self) -> &'static [Self::Field];

    /// External token for this mode (e.g. `ALL`)
    fn as_str(self) -> &'static str;
}

/// Closed set of sortable keys for one record type
pub trait SortKey: Copy + Debug + Send + Sync + 'static {
    type Field: FieldRef;

    /// Every registered key
    const ALL: &'static [Self];

    /// External, case-insensitive token (e.g. `username`)
    fn token(self) -> &'static str;

    fn field(self) -> Self::Field;

    /// Direction used when a sort-type token carries no suffix
    fn default_direction(self) -> Direction {
        Direction::Desc
    }
}

/// A searchable record read from a single table or view
pub trait Record: for<'r> FromRow<'r, SqliteRow> + Send + Sync + Unpin + 'static {
    type Field: FieldRef;
    type Mode: SearchMode<Field = Self::Field>;
    type SortKey: SortKey<Field = Self::Field>;

    /// Table or view the record is read from
    const SOURCE: &'static str;

    /// Projection matching the `FromRow` implementation
    const COLUMNS: &'static str;

    /// Unique column used for the default ordering and as tiebreaker
    const PRIMARY_KEY: Self::Field;

    /// Text value of a field, `None` for non-text fields
    fn text(&self, field: Self::Field) -> Option<&str>;
}
