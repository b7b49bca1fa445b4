//! Member entity and its search vocabulary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::query::{FieldRef, Record, SearchMode, SortKey};

/// A registered board member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub id: i64,
    pub username: String,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} ({})", self.id, self.username, self.nickname)
    }
}

/// Member columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberField {
    Id,
    Username,
    Nickname,
    CreatedAt,
}

impl FieldRef for MemberField {
    fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Username => "username",
            Self::Nickname => "nickname",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Which member fields a keyword is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberSearchMode {
    Username,
    Nickname,
    /// Username or nickname
    #[default]
    All,
}

impl SearchMode for MemberSearchMode {
    type Field = MemberField;

    fn fields(self) -> &'static [MemberField] {
        match self {
            Self::Username => &[MemberField::Username],
            Self::Nickname => &[MemberField::Nickname],
            Self::All => &[MemberField::Username, MemberField::Nickname],
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Username => "USERNAME",
            Self::Nickname => "NICKNAME",
            Self::All => "ALL",
        }
    }
}

impl FromStr for MemberSearchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USERNAME" => Ok(Self::Username),
            "NICKNAME" => Ok(Self::Nickname),
            "ALL" => Ok(Self::All),
            _ => Err(Error::InvalidSearchMode(s.trim().to_string())),
        }
    }
}

impl fmt::Display for MemberSearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sortable member keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberSortKey {
    Id,
    Username,
    Nickname,
    CreatedAt,
}

impl SortKey for MemberSortKey {
    type Field = MemberField;

    const ALL: &'static [Self] = &[Self::Id, Self::Username, Self::Nickname, Self::CreatedAt];

    fn token(self) -> &'static str {
        self.field().column()
    }

    fn field(self) -> MemberField {
        match self {
            Self::Id => MemberField::Id,
            Self::Username => MemberField::Username,
            Self::Nickname => MemberField::Nickname,
            Self::CreatedAt => MemberField::CreatedAt,
        }
    }
}

impl Record for Member {
    type Field = MemberField;
    type Mode = MemberSearchMode;
    type SortKey = MemberSortKey;

    const SOURCE: &'static str = "members";
    const COLUMNS: &'static str = "id, username, nickname, created_at";
    const PRIMARY_KEY: MemberField = MemberField::Id;

    fn text(&self, field: MemberField) -> Option<&str> {
        match field {
            MemberField::Username => Some(&self.username),
            MemberField::Nickname => Some(&self.nickname),
            MemberField::Id | MemberField::CreatedAt => None,
        }
    }
}
