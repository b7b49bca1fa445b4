//! Member repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::entity::{Member, MemberSearchMode};
use crate::domain::repository_trait::SearchRepository;
use crate::error::{Error, Result};
use crate::query::{
    Page, QueryFacade, QueryOptions, SearchDefaults, SearchParams, SortDirective,
};
use crate::storage::encode_timestamp;

/// Repository for member persistence and search
#[derive(Debug, Clone)]
pub struct MemberRepository {
    pool: SqlitePool,
    facade: QueryFacade<Member>,
}

impl MemberRepository {
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

    pub fn facade(&self) -> &QueryFacade<Member> {
        &self.facade
    }

    /// Register a member; usernames are unique
    pub async fn create(&self, username: &str, nickname: &str) -> Result<Member> {
        let username = username.trim();
        let nickname = nickname.trim();
        if username.is_empty() {
            return Err(Error::InvalidInput("username must not be empty".to_string()));
        }
        if nickname.is_empty() {
            return Err(Error::InvalidInput("nickname must not be empty".to_string()));
        }

        let member: Member = sqlx::query_as(
            r#"
            INSERT INTO members (username, nickname, created_at)
            VALUES (?, ?, ?)
            RETURNING id, username, nickname, created_at
            "#,
        )
        .bind(username)
        .bind(nickname)
        .bind(encode_timestamp(Utc::now()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                Error::InvalidInput(format!("username '{}' is already taken", username))
            }
            other => other.into(),
        })?;

        info!(member_id = member.id, username = %member.username, "Member created");
        Ok(member)
    }

    /// Get a member by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Member>> {
        let member = sqlx::query_as(
            "SELECT id, username, nickname, created_at FROM members WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// Get a member by exact username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<Member>> {
        let member = sqlx::query_as(
            "SELECT id, username, nickname, created_at FROM members WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// Total number of members
    pub async fn count(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Keyword search over members with a zero-based page window
    pub async fn find_by_kw_paged(
        &self,
        mode: MemberSearchMode,
        keyword: &str,
        sort: &[SortDirective],
        page_index: u32,
        page_size: u32,
    ) -> Result<Page<Member>> {
        debug!(mode = %mode, keyword, page_index, page_size, "Searching members");
        self.facade
            .search(mode, keyword, sort, page_index, page_size)
            .await
    }

    /// Number of members the keyword matches, with the same predicate as `find_by_kw_paged`
    pub async fn count_by_kw(&self, mode: MemberSearchMode, keyword: &str) -> Result<u64> {
        self.facade.count(mode, keyword).await
    }

    pub async fn exists_by_kw(&self, mode: MemberSearchMode, keyword: &str) -> Result<bool> {
        self.facade.exists(mode, keyword).await
    }

    /// Members with the given ids, ascending by id; unknown ids are skipped
    pub async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Member>> {
        self.facade.find_by_ids(ids).await
    }
}

#[async_trait]
impl SearchRepository for MemberRepository {
    type Record = Member;

    async fn search(
        &self,
        params: &SearchParams,
        defaults: &SearchDefaults,
    ) -> Result<Page<Member>> {
        self.facade.search_params(params, defaults).await
    }

    async fn count(&self) -> Result<u64> {
        MemberRepository::count(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    async fn create_test_repo() -> (Database, MemberRepository) {
        let db = Database::in_memory()
            .await
            .expect("Failed to create test database");
        let repo = MemberRepository::new(db.pool().clone());
        (db, repo)
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (_db, repo) = create_test_repo().await;

        let created = repo.create("user1", "유저1").await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.nickname, "유저1");

        let by_id = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "user1");

        let by_name = repo.find_by_username("user1").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);

        assert!(repo.find_by_id(999).await.unwrap().is_none());
        assert!(repo.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let (_db, repo) = create_test_repo().await;

        repo.create("user1", "a").await.unwrap();
        let result = repo.create("user1", "b").await;

        assert!(matches!(result, Err(Error::InvalidInput(msg)) if msg.contains("user1")));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_blank_fields_rejected() {
        let (_db, repo) = create_test_repo().await;

        assert!(matches!(repo.create("  ", "a").await, Err(Error::InvalidInput(_))));
        assert!(matches!(repo.create("user", "").await, Err(Error::InvalidInput(_))));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_by_kw_paged_by_nickname() {
        let (_db, repo) = create_test_repo().await;
        repo.create("alice", "토끼").await.unwrap();
        repo.create("bob", "거북이").await.unwrap();
        repo.create("carol", "산토끼").await.unwrap();

        let page = repo
            .find_by_kw_paged(
                MemberSearchMode::Nickname,
                "토끼",
                &[SortDirective::asc("username")],
                0,
                10,
            )
            .await
            .unwrap();

        let names: Vec<_> = page.content.iter().map(|m| m.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "carol"]);
        assert_eq!(page.total_elements, 2);
    }

    #[tokio::test]
    async fn test_search_through_trait_object() {
        let (_db, repo) = create_test_repo().await;
        repo.create("user1", "a").await.unwrap();
        repo.create("user2", "b").await.unwrap();

        let repo: Box<dyn SearchRepository<Record = Member>> = Box::new(repo);
        let page = repo
            .search(
                &SearchParams::new().kw_type("USERNAME").keyword("user"),
                &SearchDefaults::default(),
            )
            .await
            .unwrap();

        let names: Vec<_> = page.content.iter().map(|m| m.username.as_str()).collect();
        assert_eq!(names, vec!["user2", "user1"]);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_count_and_exists_by_kw() {
        let (_db, repo) = create_test_repo().await;
        repo.create("alice", "토끼").await.unwrap();
        repo.create("bob", "거북이").await.unwrap();
        repo.create("carol", "산토끼").await.unwrap();

        assert_eq!(repo.count_by_kw(MemberSearchMode::Nickname, "토끼").await.unwrap(), 2);
        assert_eq!(repo.count_by_kw(MemberSearchMode::All, "").await.unwrap(), 3);
        assert_eq!(repo.count_by_kw(MemberSearchMode::Username, "토끼").await.unwrap(), 0);

        assert!(repo.exists_by_kw(MemberSearchMode::Username, "bo").await.unwrap());
        assert!(!repo.exists_by_kw(MemberSearchMode::All, "dave").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_by_ids() {
        let (_db, repo) = create_test_repo().await;
        let alice = repo.create("alice", "a").await.unwrap();
        let bob = repo.create("bob", "b").await.unwrap();

        let found = repo.find_by_ids(&[bob.id, alice.id, bob.id, 404]).await.unwrap();
        let names: Vec<_> = found.iter().map(|m| m.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);

        assert!(repo.find_by_ids(&[404]).await.unwrap().is_empty());
    }
}
