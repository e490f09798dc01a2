//! Feed aggregation for gator.
//!
//! Fetching, normalization, ingestion and the scheduling loop, plus the
//! feed and follow operations the commands use.

pub mod fetcher;
pub mod ingest;
pub mod normalizer;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod types;

pub use fetcher::{parse_feed, FeedSource, HttpFetcher, USER_AGENT};
pub use ingest::Ingestor;
pub use normalizer::{normalize_item, parse_published_at, try_normalize, DateLayout, SkipReason};
pub use repository::{FeedFollowRepository, FeedRepository, PostRepository};
pub use scheduler::{parse_interval, Scheduler, MAX_INTERVAL};
pub use service::{parse_browse_limit, validate_feed_url, FeedService};
pub use types::{
    Feed, FeedFollow, FeedFollowView, FeedWithCreator, IngestReport, NewFeed, NewPost,
    ParsedFeed, ParsedItem, Post, PostWithFeed, DEFAULT_BROWSE_LIMIT, MAX_FEED_SIZE,
};
