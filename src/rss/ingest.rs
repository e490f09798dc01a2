//! One fetch-and-store cycle for a single feed.
//!
//! Steps commit individually; nothing spans the whole cycle. The feed is
//! marked fetched before the network round trip, so a failing feed moves to
//! the back of the rotation instead of being retried on every tick.

use tracing::{debug, info, warn};

use crate::db::Database;
use crate::rss::fetcher::FeedSource;
use crate::rss::normalizer::normalize_item;
use crate::rss::repository::{FeedRepository, PostRepository};
use crate::rss::types::{Feed, IngestReport};
use crate::Result;

/// Runs ingestion cycles against the store.
pub struct Ingestor<'a> {
    db: &'a Database,
    source: &'a dyn FeedSource,
}

impl<'a> Ingestor<'a> {
    /// Create an ingestor reading feeds through `source`.
    pub fn new(db: &'a Database, source: &'a dyn FeedSource) -> Self {
        Self { db, source }
    }

    /// Fetch `feed` and store its new posts.
    ///
    /// Fetch failures abort the cycle after `last_fetched_at` has already
    /// been advanced. Items the normalizer rejects are skipped; posts whose
    /// URL is already stored count as duplicates, not errors.
    pub async fn ingest(&self, feed: &Feed) -> Result<IngestReport> {
        let feeds = FeedRepository::new(self.db.pool());
        feeds.mark_fetched(feed.id).await?;

        let parsed = match self.source.fetch(&feed.url).await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(feed = %feed.name, url = %feed.url, "Failed to fetch feed: {}", e);
                return Err(e);
            }
        };

        let posts = PostRepository::new(self.db.pool());
        let mut report = IngestReport {
            items: parsed.items.len(),
            ..IngestReport::default()
        };

        for item in &parsed.items {
            let Some(post) = normalize_item(item, feed.id) else {
                report.skipped += 1;
                continue;
            };

            if posts.create_or_ignore(&post).await? {
                debug!(url = %post.url, "Stored post");
                report.stored += 1;
            } else {
                report.duplicates += 1;
            }
        }

        info!(
            feed = %feed.name,
            "Feed collected: {} item(s), {} new, {} already stored, {} skipped",
            report.items,
            report.stored,
            report.duplicates,
            report.skipped
        );

        Ok(report)
    }

    /// Ingest the least recently fetched feed, if any feed exists.
    pub async fn ingest_next(&self) -> Result<Option<(Feed, IngestReport)>> {
        let feeds = FeedRepository::new(self.db.pool());
        let Some(feed) = feeds.get_next_to_fetch().await? else {
            return Ok(None);
        };

        let report = self.ingest(&feed).await?;
        Ok(Some((feed, report)))
    }
}
