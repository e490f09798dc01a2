//! Test helpers for integration tests.
//!
//! Provides a scripted feed source and helpers for seeding the store.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use gator::rss::{Feed, FeedService, FeedSource, ParsedFeed, ParsedItem};
use gator::{AppContext, Config, Database, GatorError, NewUser, User, UserRepository};

/// Feed source answering from a fixed script instead of the network.
///
/// Unknown URLs fail like an unreachable host. Every call is recorded.
#[derive(Default)]
pub struct ScriptedSource {
    responses: Mutex<HashMap<String, Result<ParsedFeed, String>>>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `feed` for `url`.
    pub fn with_feed(self, url: &str, feed: ParsedFeed) -> Self {
        self.set_feed(url, feed);
        self
    }

    /// Fail every fetch of `url` with `message`.
    pub fn with_failure(self, url: &str, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(message.to_string()));
        self
    }

    /// Sleep this long inside every fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Cancel `token` as soon as the `n`th fetch starts.
    pub fn cancel_after(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }

    /// Replace what `url` serves.
    pub fn set_feed(&self, url: &str, feed: ParsedFeed) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(feed));
    }

    /// URLs fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedSource for ScriptedSource {
    async fn fetch(&self, url: &str) -> gator::Result<ParsedFeed> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(url.to_string());
            calls.len()
        };

        if let Some((n, token)) = &self.cancel_after {
            if count >= *n {
                token.cancel();
            }
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.responses.lock().unwrap().get(url).cloned();
        match response {
            Some(Ok(feed)) => Ok(feed),
            Some(Err(message)) => Err(GatorError::Fetch(message)),
            None => Err(GatorError::Fetch(format!("no route to host for {url}"))),
        }
    }
}

/// Fresh in-memory database with migrations applied.
pub async fn test_db() -> Database {
    Database::open_in_memory().await.unwrap()
}

/// Register a user directly in the store.
pub async fn create_user(db: &Database, name: &str) -> User {
    UserRepository::new(db.pool())
        .create(&NewUser::new(name))
        .await
        .unwrap()
}

/// Add a feed as `user` (which also follows it).
pub async fn add_feed(db: &Database, user: &User, name: &str, url: &str) -> Feed {
    let (feed, _) = FeedService::new(db).add_feed(user, name, url).await.unwrap();
    feed
}

/// An item with a title, link and publication date.
pub fn item(title: &str, link: &str, published: &str) -> ParsedItem {
    ParsedItem::new(link, published).with_title(title)
}

/// A feed document holding `items` in order.
pub fn document(title: &str, items: Vec<ParsedItem>) -> ParsedFeed {
    ParsedFeed {
        title: title.to_string(),
        items,
        ..ParsedFeed::default()
    }
}

/// Context backed by `db` and `source`, persisting its config under `dir`.
pub fn test_context(db: Database, source: Arc<dyn FeedSource>, dir: &Path) -> AppContext {
    let config_path = dir.join(".gatorconfig.json");
    let config = Config::new("sqlite::memory:");
    config.save(&config_path).unwrap();
    AppContext::new(config, config_path, db, source)
}
