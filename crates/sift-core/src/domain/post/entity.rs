//! Post entity and its search vocabulary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::query::{FieldRef, Record, SearchMode, SortKey};

/// A board post as read from the `post_records` view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub author_nickname: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} by {}", self.id, self.title, self.author_nickname)
    }
}

/// Post record columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostField {
    Id,
    AuthorId,
    AuthorNickname,
    Title,
    Content,
    CreatedAt,
}

impl FieldRef for PostField {
    fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::AuthorId => "author_id",
            Self::AuthorNickname => "author_nickname",
            Self::Title => "title",
            Self::Content => "content",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Which post fields a keyword is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostSearchMode {
    Title,
    Content,
    AuthorNickname,
    /// Title or content
    #[default]
    All,
}

impl SearchMode for PostSearchMode {
    type Field = PostField;

    fn fields(self) -> &'static [PostField] {
        match self {
            Self::Title => &[PostField::Title],
            Self::Content => &[PostField::Content],
            Self::AuthorNickname => &[PostField::AuthorNickname],
            Self::All => &[PostField::Title, PostField::Content],
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Title => "TITLE",
            Self::Content => "CONTENT",
            Self::AuthorNickname => "AUTHOR_NICKNAME",
            Self::All => "ALL",
        }
    }
}

impl FromStr for PostSearchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TITLE" => Ok(Self::Title),
            "CONTENT" => Ok(Self::Content),
            "AUTHOR_NICKNAME" => Ok(Self::AuthorNickname),
            "ALL" => Ok(Self::All),
            _ => Err(Error::InvalidSearchMode(s.trim().to_string())),
        }
    }
}

impl fmt::Display for PostSearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sortable post keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSortKey {
    Id,
    Title,
    CreatedAt,
}

impl SortKey for PostSortKey {
    type Field = PostField;

    const ALL: &'static [Self] = &[Self::Id, Self::Title, Self::CreatedAt];

    fn token(self) -> &'static str {
        self.field().column()
    }

    fn field(self) -> PostField {
        match self {
            Self::Id => PostField::Id,
            Self::Title => PostField::Title,
            Self::CreatedAt => PostField::CreatedAt,
        }
    }
}

impl Record for Post {
    type Field = PostField;
    type Mode = PostSearchMode;
    type SortKey = PostSortKey;

    const SOURCE: &'static str = "post_records";
    const COLUMNS: &'static str = "id, author_id, author_nickname, title, content, created_at";
    const PRIMARY_KEY: PostField = PostField::Id;

    fn text(&self, field: PostField) -> Option<&str> {
        match field {
            PostField::AuthorNickname => Some(&self.author_nickname),
            PostField::Title => Some(&self.title),
            PostField::Content => Some(&self.content),
            PostField::Id | PostField::AuthorId | PostField::CreatedAt => None,
        }
    }
}
