//! Feed, follow and post repositories for gator.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::types::{
    Feed, FeedFollow, FeedFollowView, FeedWithCreator, NewFeed, NewPost, Post, PostWithFeed,
};
use crate::{GatorError, Result};

const FEED_COLUMNS: &str = "id, name, url, user_id, last_fetched_at, created_at, updated_at";

/// Repository for feed operations.
pub struct FeedRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FeedRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new feed.
    ///
    /// Fails with [`GatorError::Conflict`] when the URL is already registered.
    pub async fn create(&self, feed: &NewFeed) -> Result<Feed> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO feeds (id, name, url, user_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {FEED_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Feed>(&query)
            .bind(Uuid::new_v4())
            .bind(&feed.name)
            .bind(&feed.url)
            .bind(feed.user_id)
            .bind(now)
            .bind(now)
            .fetch_one(self.pool)
            .await
            .map_err(|e| GatorError::from_insert(e, format!("feed '{}'", feed.url)))?;

        Ok(created)
    }

    /// Get a feed by ID.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Feed>> {
        let query = format!("SELECT {FEED_COLUMNS} FROM feeds WHERE id = ?");
        let feed = sqlx::query_as::<_, Feed>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(feed)
    }

    /// Get a feed by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let query = format!("SELECT {FEED_COLUMNS} FROM feeds WHERE url = ?");
        let feed = sqlx::query_as::<_, Feed>(&query)
            .bind(url)
            .fetch_optional(self.pool)
            .await?;

        Ok(feed)
    }

    /// List all feeds in creation order.
    pub async fn list_all(&self) -> Result<Vec<Feed>> {
        let query = format!("SELECT {FEED_COLUMNS} FROM feeds ORDER BY created_at ASC");
        let feeds = sqlx::query_as::<_, Feed>(&query)
            .fetch_all(self.pool)
            .await?;

        Ok(feeds)
    }

    /// List all feeds with the name of the user who added them.
    pub async fn list_with_creators(&self) -> Result<Vec<FeedWithCreator>> {
        let feeds = sqlx::query_as::<_, FeedWithCreator>(
            r#"
            SELECT f.name, f.url, u.name AS user_name
            FROM feeds f
            JOIN users u ON u.id = f.user_id
            ORDER BY f.created_at ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(feeds)
    }

    /// Get the least recently fetched feed.
    ///
    /// Feeds that were never fetched come first; ties go to the oldest feed.
    pub async fn get_next_to_fetch(&self) -> Result<Option<Feed>> {
        let query = format!(
            "SELECT {FEED_COLUMNS} FROM feeds
             ORDER BY last_fetched_at ASC NULLS FIRST, created_at ASC
             LIMIT 1"
        );
        let feed = sqlx::query_as::<_, Feed>(&query)
            .fetch_optional(self.pool)
            .await?;

        Ok(feed)
    }

    /// Mark a feed as fetched now.
    pub async fn mark_fetched(&self, id: Uuid) -> Result<bool> {
        self.mark_fetched_at(id, Utc::now()).await
    }

    /// Mark a feed as fetched at the given time.
    pub async fn mark_fetched_at(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        let result =
            sqlx::query("UPDATE feeds SET last_fetched_at = ?, updated_at = ? WHERE id = ?")
                .bind(at)
                .bind(at)
                .bind(id)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}

const FOLLOW_VIEW_SELECT: &str = r#"
    SELECT ff.id, ff.user_id, ff.feed_id, f.name AS feed_name, u.name AS user_name, ff.created_at
    FROM feed_follows ff
    JOIN feeds f ON f.id = ff.feed_id
    JOIN users u ON u.id = ff.user_id
"#;

/// Repository for follow operations.
pub struct FeedFollowRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FeedFollowRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Make `user_id` follow `feed_id`.
    ///
    /// Fails with [`GatorError::Conflict`] if the follow already exists.
    pub async fn create(&self, user_id: Uuid, feed_id: Uuid) -> Result<FeedFollowView> {
        let now = Utc::now();
        let follow = sqlx::query_as::<_, FeedFollow>(
            "INSERT INTO feed_follows (id, user_id, feed_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, user_id, feed_id, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(feed_id)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| GatorError::from_insert(e, "follow"))?;

        let query = format!("{FOLLOW_VIEW_SELECT} WHERE ff.id = ?");
        sqlx::query_as::<_, FeedFollowView>(&query)
            .bind(follow.id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| GatorError::NotFound("follow".to_string()))
    }

    /// Get the follow of `feed_id` by `user_id`, if any.
    pub async fn get(&self, user_id: Uuid, feed_id: Uuid) -> Result<Option<FeedFollowView>> {
        let query = format!("{FOLLOW_VIEW_SELECT} WHERE ff.user_id = ? AND ff.feed_id = ?");
        let follow = sqlx::query_as::<_, FeedFollowView>(&query)
            .bind(user_id)
            .bind(feed_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(follow)
    }

    /// Remove a follow. Returns whether a row was deleted.
    pub async fn delete(&self, user_id: Uuid, feed_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM feed_follows WHERE user_id = ? AND feed_id = ?")
            .bind(user_id)
            .bind(feed_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List the follows of a user.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<FeedFollowView>> {
        let query = format!("{FOLLOW_VIEW_SELECT} WHERE ff.user_id = ? ORDER BY ff.created_at ASC");
        let follows = sqlx::query_as::<_, FeedFollowView>(&query)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        Ok(follows)
    }

    /// List the followers of a feed.
    pub async fn list_for_feed(&self, feed_id: Uuid) -> Result<Vec<FeedFollowView>> {
        let query = format!("{FOLLOW_VIEW_SELECT} WHERE ff.feed_id = ? ORDER BY ff.created_at ASC");
        let follows = sqlx::query_as::<_, FeedFollowView>(&query)
            .bind(feed_id)
            .fetch_all(self.pool)
            .await?;

        Ok(follows)
    }
}

/// Repository for post operations.
pub struct PostRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PostRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a post unless one with the same URL exists.
    ///
    /// Returns `true` if a row was inserted. Only the URL conflict is
    /// absorbed; other constraint failures are errors.
    pub async fn create_or_ignore(&self, post: &NewPost) -> Result<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO posts (id, title, url, description, published_at, feed_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&post.title)
        .bind(&post.url)
        .bind(&post.description)
        .bind(post.published_at)
        .bind(post.feed_id)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get a post by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, url, description, published_at, feed_id, created_at, updated_at
            FROM posts WHERE url = ?
            "#,
        )
        .bind(url)
        .fetch_optional(self.pool)
        .await?;

        Ok(post)
    }

    /// Count posts of a feed.
    pub async fn count_by_feed(&self, feed_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE feed_id = ?")
            .bind(feed_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Most recent posts from the feeds a user follows, newest first.
    pub async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<PostWithFeed>> {
        let posts = sqlx::query_as::<_, PostWithFeed>(
            r#"
            SELECT p.id, p.title, p.url, p.description, p.published_at, f.name AS feed_name
            FROM posts p
            JOIN feed_follows ff ON ff.feed_id = p.feed_id
            JOIN feeds f ON f.id = p.feed_id
            WHERE ff.user_id = ?
            ORDER BY p.published_at DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(posts)
    }
}
