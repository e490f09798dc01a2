//! RSS types for gator.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Maximum feed size in bytes (5MB).
pub const MAX_FEED_SIZE: u64 = 5 * 1024 * 1024;

/// Number of posts `browse` shows when no usable limit is given.
pub const DEFAULT_BROWSE_LIMIT: i64 = 2;

/// A feed registered by a user.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Feed {
    /// Feed ID.
    pub id: Uuid,
    /// Display name chosen by the creator.
    pub name: String,
    /// Canonical feed URL (unique).
    pub url: String,
    /// User who added the feed.
    pub user_id: Uuid,
    /// Last time an ingestion cycle started for this feed.
    pub last_fetched_at: Option<DateTime<Utc>>,
    /// When the feed was created.
    pub created_at: DateTime<Utc>,
    /// When the feed was last updated.
    pub updated_at: DateTime<Utc>,
}

/// New feed for creation.
#[derive(Debug, Clone)]
pub struct NewFeed {
    /// Display name.
    pub name: String,
    /// Feed URL.
    pub url: String,
    /// Creator.
    pub user_id: Uuid,
}

impl NewFeed {
    /// Create a new feed.
    pub fn new(name: impl Into<String>, url: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            user_id,
        }
    }
}

/// Feed listing row with the creator's name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedWithCreator {
    /// Feed name.
    pub name: String,
    /// Feed URL.
    pub url: String,
    /// Creator's name.
    pub user_name: String,
}

/// A user's subscription to a feed.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct FeedFollow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub feed_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A follow joined with the feed and user names.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedFollowView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub feed_id: Uuid,
    pub feed_name: String,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

/// A stored post.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Post {
    /// Post ID.
    pub id: Uuid,
    /// Title, `None` when the item had no title element.
    pub title: Option<String>,
    /// Link to the article (unique, dedup key).
    pub url: String,
    /// Description, `None` when the item had no description element.
    pub description: Option<String>,
    /// Publication time.
    pub published_at: DateTime<Utc>,
    /// Owning feed.
    pub feed_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post together with the name of the feed it came from.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostWithFeed {
    pub id: Uuid,
    pub title: Option<String>,
    pub url: String,
    pub description: Option<String>,
    pub published_at: DateTime<Utc>,
    pub feed_name: String,
}

/// Normalized post ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub feed_id: Uuid,
    pub title: Option<String>,
    pub url: String,
    pub description: Option<String>,
    pub published_at: DateTime<Utc>,
}

/// Parsed feed document.
///
/// Items keep the order in which they appear in the source document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFeed {
    /// Channel title.
    pub title: String,
    /// Channel link.
    pub link: String,
    /// Channel description.
    pub description: String,
    /// Parsed items.
    pub items: Vec<ParsedItem>,
}

/// One raw item of a parsed feed.
///
/// Every field is optional; absence is meaningful to the normalizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    /// Publication date exactly as written in the feed.
    pub published_at_raw: Option<String>,
}

impl ParsedItem {
    /// Create an item with a link and raw publication date.
    pub fn new(link: impl Into<String>, published_at_raw: impl Into<String>) -> Self {
        Self {
            link: Some(link.into()),
            published_at_raw: Some(published_at_raw.into()),
            ..Self::default()
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Outcome of one ingestion cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Items in the fetched document.
    pub items: usize,
    /// Posts newly stored.
    pub stored: usize,
    /// Items whose URL was already stored.
    pub duplicates: usize,
    /// Items dropped by the normalizer.
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_feed() {
        let user_id = Uuid::new_v4();
        let feed = NewFeed::new("Blog", "https://example.test/feed.xml", user_id);
        assert_eq!(feed.name, "Blog");
        assert_eq!(feed.url, "https://example.test/feed.xml");
        assert_eq!(feed.user_id, user_id);
    }

    #[test]
    fn test_parsed_item_builder() {
        let item = ParsedItem::new("https://example.test/p1", "2024-01-15T10:30:00Z")
            .with_title("Hello")
            .with_description("World");
        assert_eq!(item.title.as_deref(), Some("Hello"));
        assert_eq!(item.link.as_deref(), Some("https://example.test/p1"));
        assert_eq!(item.description.as_deref(), Some("World"));
        assert_eq!(item.published_at_raw.as_deref(), Some("2024-01-15T10:30:00Z"));
    }

    #[test]
    fn test_parsed_item_default_is_empty() {
        let item = ParsedItem::default();
        assert!(item.title.is_none());
        assert!(item.link.is_none());
        assert!(item.published_at_raw.is_none());
    }
}
