//! Feed operations on behalf of a user.
//!
//! Wraps the repositories with the rules the commands rely on: URL checks,
//! auto-follow on creation and lookup of feeds by URL.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::db::{Database, User};
use crate::rss::repository::{FeedFollowRepository, FeedRepository, PostRepository};
use crate::rss::types::{Feed, FeedFollowView, FeedWithCreator, PostWithFeed, DEFAULT_BROWSE_LIMIT};
use crate::{GatorError, Result};

/// Check that `url` is an absolute http(s) URL with a host.
pub fn validate_feed_url(url: &str) -> Result<()> {
    let parsed = url::Url::parse(url)
        .map_err(|e| GatorError::Validation(format!("invalid URL '{url}': {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(GatorError::Validation(format!(
                "unsupported URL scheme: {scheme}"
            )));
        }
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(GatorError::Validation(format!("URL has no host: {url}")));
    }

    Ok(())
}

/// Read the optional `browse` limit argument.
///
/// Absent, unparseable and non-positive values fall back to the default.
pub fn parse_browse_limit(arg: Option<&str>) -> i64 {
    arg.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_BROWSE_LIMIT)
}

/// Service for feed and follow operations.
pub struct FeedService<'a> {
    db: &'a Database,
}

impl<'a> FeedService<'a> {
    /// Create a new FeedService with the given database reference.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Register a feed and make its creator follow it.
    ///
    /// Both rows are written in one transaction; a feed never exists
    /// without its creator's follow.
    ///
    /// # Errors
    ///
    /// - `Validation` if the name is blank or the URL is not http(s)
    /// - `Conflict` if a feed with this URL already exists
    pub async fn add_feed(
        &self,
        user: &User,
        name: &str,
        url: &str,
    ) -> Result<(Feed, FeedFollowView)> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GatorError::Validation("feed name must not be empty".to_string()));
        }
        let url = url.trim();
        validate_feed_url(url)?;

        let now = Utc::now();
        let feed_id = Uuid::new_v4();

        let mut tx = self.db.pool().begin().await?;

        sqlx::query(
            "INSERT INTO feeds (id, name, url, user_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(feed_id)
        .bind(name)
        .bind(url)
        .bind(user.id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| GatorError::from_insert(e, format!("feed '{url}'")))?;

        sqlx::query(
            "INSERT INTO feed_follows (id, user_id, feed_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4())
        .bind(user.id)
        .bind(feed_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| GatorError::from_insert(e, "follow"))?;

        tx.commit().await?;

        let feed = FeedRepository::new(self.db.pool())
            .get_by_id(feed_id)
            .await?
            .ok_or_else(|| GatorError::NotFound(format!("feed '{url}'")))?;
        let follow = FeedFollowRepository::new(self.db.pool())
            .get(user.id, feed_id)
            .await?
            .ok_or_else(|| GatorError::NotFound("follow".to_string()))?;

        info!(user = %user.name, feed = %feed.name, url = %feed.url, "Feed added");
        Ok((feed, follow))
    }

    /// All feeds with the names of the users who added them.
    pub async fn list_feeds(&self) -> Result<Vec<FeedWithCreator>> {
        FeedRepository::new(self.db.pool()).list_with_creators().await
    }

    /// Look up a feed by URL.
    pub async fn get_feed_by_url(&self, url: &str) -> Result<Feed> {
        FeedRepository::new(self.db.pool())
            .get_by_url(url.trim())
            .await?
            .ok_or_else(|| GatorError::NotFound(format!("feed '{}'", url.trim())))
    }

    /// Follow an existing feed.
    pub async fn follow(&self, user: &User, url: &str) -> Result<FeedFollowView> {
        let feed = self.get_feed_by_url(url).await?;
        FeedFollowRepository::new(self.db.pool())
            .create(user.id, feed.id)
            .await
    }

    /// Stop following a feed. Returns the feed that was unfollowed.
    pub async fn unfollow(&self, user: &User, url: &str) -> Result<Feed> {
        let feed = self.get_feed_by_url(url).await?;
        let removed = FeedFollowRepository::new(self.db.pool())
            .delete(user.id, feed.id)
            .await?;
        if !removed {
            return Err(GatorError::NotFound(format!(
                "follow of '{}' by {}",
                feed.url, user.name
            )));
        }
        Ok(feed)
    }

    /// Feeds the user follows, oldest follow first.
    pub async fn following(&self, user: &User) -> Result<Vec<FeedFollowView>> {
        FeedFollowRepository::new(self.db.pool())
            .list_for_user(user.id)
            .await
    }

    /// Newest posts from the user's followed feeds.
    pub async fn browse(&self, user: &User, limit: i64) -> Result<Vec<PostWithFeed>> {
        PostRepository::new(self.db.pool())
            .list_for_user(user.id, limit)
            .await
    }
}
