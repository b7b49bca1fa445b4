//! Keyword predicates
//!
//! A [`Predicate`] is a plain expression tree over typed fields. It can be
//! lowered into a parameterized SQLite `WHERE` body or evaluated against a
//! record in memory; both follow the same [`MatchCase`] policy.

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};

use super::{FieldRef, Record, SearchMode};

/// Case policy for containment matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchCase {
    /// Exact substring match (`instr(column, ?) > 0`)
    #[default]
    Sensitive,
    /// ASCII letters fold, everything else compares exactly (`LIKE ... ESCAPE`)
    AsciiInsensitive,
}

/// Boolean filter expression over the fields of one record type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate<F> {
    /// Matches every record
    All,
    /// Field text contains `needle`; the empty needle matches everything
    Contains { field: F, needle: String },
    /// Every term matches; empty is true
    And { terms: Vec<Predicate<F>> },
    /// At least one term matches; empty is false
    Or { terms: Vec<Predicate<F>> },
}

impl<F: FieldRef> Predicate<F> {
    pub fn contains(field: F, needle: impl Into<String>) -> Self {
        Self::Contains {
            field,
            needle: needle.into(),
        }
    }

    /// Conjunction, flattening nested `And` nodes
    pub fn and(self, other: Self) -> Self {
        let mut terms = self.into_terms_of(|p| matches!(p, Self::And { .. }));
        terms.extend(other.into_terms_of(|p| matches!(p, Self::And { .. })));
        Self::And { terms }
    }

    /// Disjunction, flattening nested `Or` nodes
    pub fn or(self, other: Self) -> Self {
        let mut terms = self.into_terms_of(|p| matches!(p, Self::Or { .. }));
        terms.extend(other.into_terms_of(|p| matches!(p, Self::Or { .. })));
        Self::Or { terms }
    }

    fn into_terms_of(self, same_kind: impl Fn(&Self) -> bool) -> Vec<Self> {
        if same_kind(&self) {
            match self {
                Self::And { terms } | Self::Or { terms } => terms,
                other => vec![other],
            }
        } else {
            vec![self]
        }
    }

    /// Evaluate against a record using the same case policy as the SQL form
    pub fn is_satisfied_by<R>(&self, record: &R, case: MatchCase) -> bool
    where
        R: Record<Field = F>,
    {
        match self {
            Self::All => true,
            Self::Contains { field, needle } => record
                .text(*field)
                .is_some_and(|text| text_contains(text, needle, case)),
            Self::And { terms } => terms.iter().all(|t| t.is_satisfied_by(record, case)),
            Self::Or { terms } => terms.iter().any(|t| t.is_satisfied_by(record, case)),
        }
    }

    /// Append this predicate as a `WHERE` body; keyword text is always bound
    pub fn push_sql(&self, builder: &mut QueryBuilder<'_, Sqlite>, case: MatchCase) {
        match self {
            Self::All => {
                builder.push("1 = 1");
            }
            Self::Contains { field, needle } => match case {
                MatchCase::Sensitive => {
                    builder
                        .push("instr(")
                        .push(field.column())
                        .push(", ")
                        .push_bind(needle.clone())
                        .push(") > 0");
                }
                MatchCase::AsciiInsensitive => {
                    builder
                        .push(field.column())
                        .push(" LIKE ")
                        .push_bind(like_pattern(needle))
                        .push(" ESCAPE '\\'");
                }
            },
            Self::And { terms } => push_joined(builder, terms, " AND ", "1 = 1", case),
            Self::Or { terms } => push_joined(builder, terms, " OR ", "1 = 0", case),
        }
    }
}

fn push_joined<F: FieldRef>(
    builder: &mut QueryBuilder<'_, Sqlite>,
    terms: &[Predicate<F>],
    separator: &str,
    identity: &str,
    case: MatchCase,
) {
    if terms.is_empty() {
        builder.push(identity);
        return;
    }

    builder.push("(");
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            builder.push(separator);
        }
        term.push_sql(builder, case);
    }
    builder.push(")");
}

fn text_contains(text: &str, needle: &str, case: MatchCase) -> bool {
    match case {
        MatchCase::Sensitive => text.contains(needle),
        MatchCase::AsciiInsensitive => text
            .to_ascii_lowercase()
            .contains(&needle.to_ascii_lowercase()),
    }
}

/// `%needle%` with LIKE metacharacters escaped by `\`
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Builds keyword predicates for a search mode
pub struct PredicateBuilder;

impl PredicateBuilder {
    /// Single-field modes yield one `Contains`; multi-field modes an `Or` of them
    pub fn build<M: SearchMode>(mode: M, keyword: &str) -> Predicate<M::Field> {
        match mode.fields() {
            [] => Predicate::All,
            [field] => Predicate::contains(*field, keyword),
            fields => Predicate::Or {
                terms: fields
                    .iter()
                    .map(|field| Predicate::contains(*field, keyword))
                    .collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::member::{Member, MemberField, MemberSearchMode};
    use chrono::Utc;

    fn member(username: &str, nickname: &str) -> Member {
        Member {
            id: 1,
            username: username.to_string(),
            nickname: nickname.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_single_field_mode_builds_contains() {
        let predicate = PredicateBuilder::build(MemberSearchMode::Username, "user");
        assert_eq!(predicate, Predicate::contains(MemberField::Username, "user"));
    }

    #[test]
    fn test_all_mode_builds_or_over_fields() {
        let predicate = PredicateBuilder::build(MemberSearchMode::All, "kim");
        assert_eq!(
            predicate,
            Predicate::Or {
                terms: vec![
                    Predicate::contains(MemberField::Username, "kim"),
                    Predicate::contains(MemberField::Nickname, "kim"),
                ]
            }
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let first = PredicateBuilder::build(MemberSearchMode::All, "같은");
        let second = PredicateBuilder::build(MemberSearchMode::All, "같은");
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_empty_keyword_matches_everything() {
        let predicate = PredicateBuilder::build(MemberSearchMode::Nickname, "");
        assert!(predicate.is_satisfied_by(&member("a", "b"), MatchCase::Sensitive));
        assert!(predicate.is_satisfied_by(&member("a", ""), MatchCase::Sensitive));
    }

    #[test]
    fn test_any_field_satisfies_all_mode() {
        let predicate = PredicateBuilder::build(MemberSearchMode::All, "lee");
        assert!(predicate.is_satisfied_by(&member("lee01", "x"), MatchCase::Sensitive));
        assert!(predicate.is_satisfied_by(&member("x", "mr.lee"), MatchCase::Sensitive));
        assert!(!predicate.is_satisfied_by(&member("park", "choi"), MatchCase::Sensitive));
    }

    #[test]
    fn test_case_policy() {
        let predicate = PredicateBuilder::build(MemberSearchMode::Username, "Admin");
        let record = member("superadmin", "x");
        assert!(!predicate.is_satisfied_by(&record, MatchCase::Sensitive));
        assert!(predicate.is_satisfied_by(&record, MatchCase::AsciiInsensitive));
    }

    #[test]
    fn test_non_text_field_never_contains() {
        let predicate = Predicate::contains(MemberField::Id, "");
        assert!(!predicate.is_satisfied_by(&member("a", "b"), MatchCase::Sensitive));
    }

    #[test]
    fn test_and_or_flatten() {
        let a = Predicate::contains(MemberField::Username, "a");
        let b = Predicate::contains(MemberField::Nickname, "b");
        let c = Predicate::contains(MemberField::Nickname, "c");

        let or = a.clone().or(b.clone()).or(c.clone());
        assert_eq!(
            or,
            Predicate::Or {
                terms: vec![a.clone(), b.clone(), c.clone()]
            }
        );

        let and = a.clone().and(or.clone());
        assert_eq!(and, Predicate::And { terms: vec![a, or] });
    }

    #[test]
    fn test_empty_and_or_identities() {
        let record = member("a", "b");
        let and: Predicate<MemberField> = Predicate::And { terms: vec![] };
        let or: Predicate<MemberField> = Predicate::Or { terms: vec![] };
        assert!(and.is_satisfied_by(&record, MatchCase::Sensitive));
        assert!(!or.is_satisfied_by(&record, MatchCase::Sensitive));
    }

    #[test]
    fn test_sql_binds_keyword_instead_of_inlining() {
        let hostile = "x') OR 1=1 --";
        let predicate = PredicateBuilder::build(MemberSearchMode::All, hostile);

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT id FROM members WHERE ");
        predicate.push_sql(&mut builder, MatchCase::Sensitive);

        let sql = builder.sql();
        assert!(!sql.contains(hostile));
        assert_eq!(
            sql,
            "SELECT id FROM members WHERE (instr(username, ?) > 0 OR instr(nickname, ?) > 0)"
        );
    }

    #[test]
    fn test_sql_like_form() {
        let predicate = PredicateBuilder::build(MemberSearchMode::Nickname, "50%_off");

        let mut builder = QueryBuilder::<Sqlite>::new("");
        predicate.push_sql(&mut builder, MatchCase::AsciiInsensitive);
        assert_eq!(builder.sql(), "nickname LIKE ? ESCAPE '\\'");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_serializes_as_tagged_tree() {
        let predicate = PredicateBuilder::build(MemberSearchMode::All, "k");
        let json = serde_json::to_value(&predicate).unwrap();
        assert_eq!(json["op"], "or");
        assert_eq!(json["terms"][0]["op"], "contains");
        assert_eq!(json["terms"][0]["field"], "username");

        let back: Predicate<MemberField> = serde_json::from_value(json).unwrap();
        assert_eq!(back, predicate);
    }
}
