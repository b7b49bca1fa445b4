//! Post repository for database operations
//!
//! Writes go to the `posts` table; every read comes from the `post_records`
//! view so the author nickname is part of the record.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::entity::{Post, PostSearchMode};
use crate::domain::repository_trait::SearchRepository;
use crate::error::{Error, Result};
use crate::query::{
    Page, QueryFacade, QueryOptions, SearchDefaults, SearchParams, SortDirective,
};
use crate::storage::encode_timestamp;

/// Repository for post persistence and search
#[derive(Debug, Clone)]
pub struct PostRepository {
    pool: SqlitePool,
    facade: QueryFacade<Post>,
}

impl PostRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_options(pool, QueryOptions::default())
    }

    /// Create a repository whose searches use `options`
    pub fn with_options(pool: SqlitePool, options: QueryOptions) -> Self {
        let facade = QueryFacade::new(pool.clone(), options);
        Self { pool, facade }
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn facade(&self) -> &QueryFacade<Post> {
        &self.facade
    }

    /// Write a post for an existing member
    pub async fn create(&self, author_id: i64, title: &str, content: &str) -> Result<Post> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("title must not be empty".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let author: Option<(i64,)> = sqlx::query_as("SELECT id FROM members WHERE id = ?")
            .bind(author_id)
            .fetch_optional(&mut *tx)
            .await?;
        if author.is_none() {
            return Err(Error::MemberNotFound(author_id));
        }

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO posts (author_id, title, content, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(author_id)
        .bind(title)
        .bind(content)
        .bind(encode_timestamp(Utc::now()))
        .fetch_one(&mut *tx)
        .await?;

        let post: Post = sqlx::query_as(
            r#"
            SELECT id, author_id, author_nickname, title, content, created_at
            FROM post_records
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(post_id = post.id, author_id, "Post created");
        Ok(post)
    }

    /// Get a post by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as(
            r#"
            SELECT id, author_id, author_nickname, title, content, created_at
            FROM post_records
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    /// Total number of posts
    pub async fn count(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Keyword search over posts with a zero-based page window
    pub async fn find_by_kw_paged(
        &self,
        mode: PostSearchMode,
        keyword: &str,
        sort: &[SortDirective],
        page_index: u32,
        page_size: u32,
    ) -> Result<Page<Post>> {
        debug!(mode = %mode, keyword, page_index, page_size, "Searching posts");
        self.facade
            .search(mode, keyword, sort, page_index, page_size)
            .await
    }

    /// Number of posts the keyword matches, with the same predicate as `find_by_kw_paged`
    pub async fn count_by_kw(&self, mode: PostSearchMode, keyword: &str) -> Result<u64> {
        self.facade.count(mode, keyword).await
    }

    pub async fn exists_by_kw(&self, mode: PostSearchMode, keyword: &str) -> Result<bool> {
        self.facade.exists(mode, keyword).await
    }

    /// Posts with the given ids, ascending by id; unknown ids are skipped
    pub async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Post>> {
        self.facade.find_by_ids(ids).await
    }
}

#[async_trait]
impl SearchRepository for PostRepository {
    type Record = Post;

    async fn search(&self, params: &SearchParams, defaults: &SearchDefaults) -> Result<Page<Post>> {
        self.facade.search_params(params, defaults).await
    }

    async fn count(&self) -> Result<u64> {
        PostRepository::count(self).await
    }
}
