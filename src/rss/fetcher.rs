//! Feed retrieval and RSS parsing.
//!
//! A fetch either yields a complete [`ParsedFeed`] or fails; partial
//! documents are never returned. There is no retry and no caching here.

use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use reqwest::Client;
use tracing::debug;

use crate::rss::types::{ParsedFeed, ParsedItem, MAX_FEED_SIZE};
use crate::{GatorError, Result};

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Read timeout in seconds.
const READ_TIMEOUT_SECS: u64 = 20;

/// Total timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Client identifier sent to feed servers.
pub const USER_AGENT: &str = "gator";

/// Anything that can turn a feed URL into a parsed document.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse the feed at `url`.
    async fn fetch(&self, url: &str) -> Result<ParsedFeed>;
}

/// HTTP feed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with the default total timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a fetcher whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .read_timeout(Duration::from_secs(READ_TIMEOUT_SECS).min(timeout))
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GatorError::Fetch(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FeedSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<ParsedFeed> {
        debug!("Fetching feed {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GatorError::Fetch(format!("failed to fetch feed: {}", e)))?;

        if !response.status().is_success() {
            return Err(GatorError::Fetch(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > MAX_FEED_SIZE {
                return Err(GatorError::Fetch(format!(
                    "feed too large: {} bytes (max {} bytes)",
                    content_length, MAX_FEED_SIZE
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatorError::Fetch(format!("failed to read response: {}", e)))?;

        if bytes.len() as u64 > MAX_FEED_SIZE {
            return Err(GatorError::Fetch(format!(
                "feed too large: {} bytes (max {} bytes)",
                bytes.len(),
                MAX_FEED_SIZE
            )));
        }

        let feed = parse_feed(&bytes)?;
        debug!("Parsed {} items from {}", feed.items.len(), url);
        Ok(feed)
    }
}

/// Which text field the reader is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Description,
    PubDate,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"description" => Some(Field::Description),
            b"pubDate" => Some(Field::PubDate),
            _ => None,
        }
    }
}

fn item_slot(item: &mut ParsedItem, field: Field) -> &mut Option<String> {
    match field {
        Field::Title => &mut item.title,
        Field::Link => &mut item.link,
        Field::Description => &mut item.description,
        Field::PubDate => &mut item.published_at_raw,
    }
}

fn channel_slot(feed: &mut ParsedFeed, field: Field) -> Option<&mut String> {
    match field {
        Field::Title => Some(&mut feed.title),
        Field::Link => Some(&mut feed.link),
        Field::Description => Some(&mut feed.description),
        Field::PubDate => None,
    }
}

fn xml_error(e: impl std::fmt::Display) -> GatorError {
    GatorError::Fetch(format!("XML parse error: {}", e))
}

/// Parse an RSS 2.0 document.
pub fn parse_feed(xml: &[u8]) -> Result<ParsedFeed> {
    let mut reader = Reader::from_reader(xml);

    let mut feed = ParsedFeed::default();
    let mut saw_channel = false;
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut current_item: Option<ParsedItem> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();
                open_element(&e, &stack, &mut current_item, &mut saw_channel);
                stack.push(name);
            }
            Event::Empty(e) => {
                open_element(&e, &stack, &mut current_item, &mut saw_channel);
            }
            Event::End(e) => {
                stack.pop();
                let closes_item = e.name().as_ref() == b"item"
                    && stack.last().map(Vec::as_slice) == Some(&b"channel"[..]);
                if closes_item {
                    if let Some(item) = current_item.take() {
                        feed.items.push(item);
                    }
                }
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(xml_error)?;
                append_text(&stack, &mut feed, current_item.as_mut(), &text);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                append_text(&stack, &mut feed, current_item.as_mut(), &text);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(xml_error("unexpected end of document"));
    }
    if !saw_channel {
        return Err(GatorError::Fetch(
            "document has no <channel> element".to_string(),
        ));
    }

    // Text and CDATA chunks of one element are joined first, then trimmed.
    feed.title = decode_entities(feed.title.trim());
    feed.link = feed.link.trim().to_string();
    feed.description = decode_entities(feed.description.trim());
    for item in &mut feed.items {
        item.title = item.title.as_deref().map(str::trim).map(decode_entities);
        item.link = item.link.as_deref().map(|s| s.trim().to_string());
        item.description = item.description.as_deref().map(str::trim).map(decode_entities);
        item.published_at_raw = item.published_at_raw.as_deref().map(|s| s.trim().to_string());
    }

    Ok(feed)
}

/// Handle a start (or self-closing) tag whose parent path is `stack`.
fn open_element(
    e: &BytesStart<'_>,
    stack: &[Vec<u8>],
    current_item: &mut Option<ParsedItem>,
    saw_channel: &mut bool,
) {
    let name = e.name();
    let parent = stack.last().map(Vec::as_slice);
    match (name.as_ref(), parent) {
        (b"channel", _) => *saw_channel = true,
        (b"item", Some(b"channel")) => *current_item = Some(ParsedItem::default()),
        (field, Some(b"item")) => {
            if let (Some(field), Some(item)) = (Field::from_name(field), current_item.as_mut()) {
                // Present but possibly empty; distinct from an absent element.
                item_slot(item, field).get_or_insert_with(String::new);
            }
        }
        _ => {}
    }
}

fn append_text(
    stack: &[Vec<u8>],
    feed: &mut ParsedFeed,
    current_item: Option<&mut ParsedItem>,
    text: &str,
) {
    let [.., parent, element] = stack else {
        return;
    };
    let Some(field) = Field::from_name(element) else {
        return;
    };
    match parent.as_slice() {
        b"item" => {
            if let Some(item) = current_item {
                item_slot(item, field)
                    .get_or_insert_with(String::new)
                    .push_str(text);
            }
        }
        b"channel" => {
            if let Some(slot) = channel_slot(feed, field) {
                slot.push_str(text);
            }
        }
        _ => {}
    }
}

/// Decode entities that survived XML unescaping (double-escaped feeds).
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    match quick_xml::escape::unescape(text) {
        Ok(Cow::Borrowed(s)) => s.to_string(),
        Ok(Cow::Owned(s)) => s,
        Err(_) => text.to_string(),
    }
}
