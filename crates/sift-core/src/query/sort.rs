//! Sort directives and the sort registry
//!
//! Callers name sort keys with free-form tokens. The [`SortRegistry`] is the
//! only place those tokens are turned into columns: anything it does not know
//! is dropped, and an ordering that resolves to nothing falls back to the
//! primary key so page boundaries stay deterministic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;

use super::{FieldRef, SortKey};
use crate::error::{Error, Result};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(Error::InvalidSortDirection(s.to_string())),
        }
    }
}

/// A caller-requested (key, direction) pair; the key is not yet trusted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    pub key: String,
    pub direction: Direction,
}

impl SortDirective {
    pub fn new(key: impl Into<String>, direction: Direction) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }

    pub fn asc(key: impl Into<String>) -> Self {
        Self::new(key, Direction::Asc)
    }

    pub fn desc(key: impl Into<String>) -> Self {
        Self::new(key, Direction::Desc)
    }
}

/// One resolved ordering component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTerm<F> {
    pub field: F,
    pub direction: Direction,
}

/// Effective ordering, already restricted to registered fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy<F> {
    terms: Vec<OrderTerm<F>>,
}

impl<F: FieldRef> OrderBy<F> {
    pub fn terms(&self) -> &[OrderTerm<F>] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn contains_field(&self, field: F) -> bool {
        self.terms.iter().any(|t| t.field == field)
    }

    fn push(&mut self, field: F, direction: Direction) {
        if !self.contains_field(field) {
            self.terms.push(OrderTerm { field, direction });
        }
    }

    /// Append ` ORDER BY ...`; nothing is appended for an empty ordering
    pub fn push_sql(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        for (i, term) in self.terms.iter().enumerate() {
            builder.push(if i == 0 { " ORDER BY " } else { ", " });
            builder
                .push(term.field.column())
                .push(" ")
                .push(term.direction.as_sql());
        }
    }
}

#[derive(Debug, Clone)]
struct SortEntry<F> {
    token: &'static str,
    field: F,
    default_direction: Direction,
}

/// Closed token → field mapping for one record type
#[derive(Debug, Clone)]
pub struct SortRegistry<F> {
    entries: Vec<SortEntry<F>>,
    primary_key: F,
}

impl<F: FieldRef> SortRegistry<F> {
    /// Empty registry; the primary key is the fallback ordering and tiebreaker
    pub fn new(primary_key: F) -> Self {
        Self {
            entries: Vec::new(),
            primary_key,
        }
    }

    /// Registry holding every key of a [`SortKey`] enum
    pub fn for_keys<K: SortKey<Field = F>>(primary_key: F) -> Self {
        K::ALL.iter().fold(Self::new(primary_key), |registry, key| {
            registry.register(key.token(), key.field(), key.default_direction())
        })
    }

    pub fn register(mut self, token: &'static str, field: F, default_direction: Direction) -> Self {
        self.entries.push(SortEntry {
            token,
            field,
            default_direction,
        });
        self
    }

    /// Registered tokens in registration order
    pub fn tokens(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.token)
    }

    fn entry(&self, token: &str) -> Option<&SortEntry<F>> {
        let wanted = normalize_token(token);
        self.entries
            .iter()
            .find(|e| normalize_token(e.token) == wanted)
    }

    /// Case-insensitive lookup; `created_at`, `createdAt` and `CREATED_AT` are the same key
    pub fn resolve(&self, token: &str) -> Option<F> {
        self.entry(token).map(|e| e.field)
    }

    /// Resolve directives in caller order, dropping unknown and repeated keys
    ///
    /// Falls back to the primary key ascending when nothing resolves, and
    /// always ends with the primary key so ties never reorder between pages.
    pub fn resolve_all(&self, directives: &[SortDirective]) -> OrderBy<F> {
        let mut order_by = OrderBy { terms: Vec::new() };

        for directive in directives {
            match self.resolve(&directive.key) {
                Some(field) => order_by.push(field, directive.direction),
                None => debug!(key = %directive.key, "Dropping unregistered sort key"),
            }
        }

        if order_by.is_empty() {
            debug!("No sort key resolved, ordering by primary key");
        }
        order_by.push(self.primary_key, Direction::Asc);
        order_by
    }

    /// Parse a sort-type token such as `ID`, `USERNAME_ASC` or `title_desc`
    ///
    /// A bare key uses the key's default direction. Unknown keys still yield
    /// a directive; `resolve_all` drops them later.
    pub fn parse_sort_type(&self, token: &str) -> SortDirective {
        let trimmed = token.trim();
        let upper = trimmed.to_ascii_uppercase();

        let (key, direction) = if let Some(key) = upper.strip_suffix("_ASC") {
            (&trimmed[..key.len()], Some(Direction::Asc))
        } else if let Some(key) = upper.strip_suffix("_DESC") {
            (&trimmed[..key.len()], Some(Direction::Desc))
        } else {
            (trimmed, None)
        };

        let direction = direction.unwrap_or_else(|| {
            self.entry(key)
                .map(|e| e.default_direction)
                .unwrap_or(Direction::Desc)
        });

        SortDirective::new(key.to_ascii_lowercase(), direction)
    }
}

fn normalize_token(token: &str) -> String {
    token
        .trim()
        .chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::member::{MemberField, MemberSortKey};

    fn registry() -> SortRegistry<MemberField> {
        SortRegistry::for_keys::<MemberSortKey>(MemberField::Id)
    }

    fn fields(order_by: &OrderBy<MemberField>) -> Vec<(MemberField, Direction)> {
        order_by
            .terms()
            .iter()
            .map(|t| (t.field, t.direction))
            .collect()
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let registry = registry();
        assert_eq!(registry.resolve("id"), Some(MemberField::Id));
        assert_eq!(registry.resolve("USERNAME"), Some(MemberField::Username));
        assert_eq!(registry.resolve("createdAt"), Some(MemberField::CreatedAt));
        assert_eq!(registry.resolve(" created_at "), Some(MemberField::CreatedAt));
    }

    #[test]
    fn test_unknown_key_resolves_to_none() {
        let registry = registry();
        assert_eq!(registry.resolve("password"), None);
        assert_eq!(registry.resolve("id; DROP TABLE members"), None);
        assert_eq!(registry.resolve(""), None);
    }

    #[test]
    fn test_tokens_list_every_key() {
        let tokens: Vec<_> = registry().tokens().collect();
        assert_eq!(tokens, vec!["id", "username", "nickname", "created_at"]);
    }

    #[test]
    fn test_multi_key_keeps_caller_order() {
        let order_by = registry().resolve_all(&[
            SortDirective::asc("nickname"),
            SortDirective::desc("username"),
        ]);
        assert_eq!(
            fields(&order_by),
            vec![
                (MemberField::Nickname, Direction::Asc),
                (MemberField::Username, Direction::Desc),
                (MemberField::Id, Direction::Asc),
            ]
        );
    }

    #[test]
    fn test_unknown_key_behaves_like_no_sort() {
        let registry = registry();
        let bogus = registry.resolve_all(&[SortDirective::asc("bogus")]);
        let none = registry.resolve_all(&[]);
        assert_eq!(bogus, none);
        assert_eq!(fields(&none), vec![(MemberField::Id, Direction::Asc)]);
    }

    #[test]
    fn test_unknown_key_is_dropped_between_known_keys() {
        let order_by = registry().resolve_all(&[
            SortDirective::desc("nickname"),
            SortDirective::asc("bogus"),
            SortDirective::desc("id"),
        ]);
        assert_eq!(
            fields(&order_by),
            vec![
                (MemberField::Nickname, Direction::Desc),
                (MemberField::Id, Direction::Desc),
            ]
        );
    }

    #[test]
    fn test_repeated_key_keeps_first_direction() {
        let order_by =
            registry().resolve_all(&[SortDirective::desc("id"), SortDirective::asc("ID")]);
        assert_eq!(fields(&order_by), vec![(MemberField::Id, Direction::Desc)]);
    }

    #[test]
    fn test_parse_sort_type() {
        let registry = registry();
        assert_eq!(registry.parse_sort_type("ID"), SortDirective::desc("id"));
        assert_eq!(registry.parse_sort_type("ID_ASC"), SortDirective::asc("id"));
        assert_eq!(
            registry.parse_sort_type("username_asc"),
            SortDirective::asc("username")
        );
        assert_eq!(
            registry.parse_sort_type("CREATED_AT_DESC"),
            SortDirective::desc("created_at")
        );
        assert_eq!(registry.parse_sort_type("BOGUS"), SortDirective::desc("bogus"));
    }

    #[test]
    fn test_order_by_sql() {
        let order_by = registry().resolve_all(&[SortDirective::desc("nickname")]);
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT id FROM members");
        order_by.push_sql(&mut builder);
        assert_eq!(
            builder.sql(),
            "SELECT id FROM members ORDER BY nickname DESC, id ASC"
        );
    }

    #[test]
    fn test_direction_from_str() {
        assert_eq!("asc".parse::<Direction>().unwrap(), Direction::Asc);
        assert_eq!("DESC".parse::<Direction>().unwrap(), Direction::Desc);
        assert!(matches!(
            "sideways".parse::<Direction>(),
            Err(Error::InvalidSortDirection(_))
        ));
    }
}
