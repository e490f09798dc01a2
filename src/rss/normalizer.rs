//! Conversion of raw feed items into storable posts.
//!
//! Feed providers disagree on how to write publication dates, so a fixed,
//! ordered list of layouts is tried and the first match wins. Items that
//! cannot be dated or have no link are dropped with a warning; they never
//! fail the ingestion cycle.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use super::types::{NewPost, ParsedItem};

/// Timestamp layouts understood by the normalizer, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLayout {
    /// `Mon, 02 Jan 2006 15:04:05 MST`
    Rfc1123,
    /// `Mon, 02 Jan 2006 15:04:05 -0700`
    Rfc1123Z,
    /// `02 Jan 06 15:04 MST`
    Rfc822,
    /// `02 Jan 06 15:04 -0700`
    Rfc822Z,
    /// `2006-01-02T15:04:05Z07:00`
    Rfc3339,
}

/// Layout order.
pub const DATE_LAYOUTS: [DateLayout; 5] = [
    DateLayout::Rfc1123,
    DateLayout::Rfc1123Z,
    DateLayout::Rfc822,
    DateLayout::Rfc822Z,
    DateLayout::Rfc3339,
];

const RFC1123_BODY: &str = "%d %b %Y %H:%M:%S";
const RFC822_BODY: &str = "%d %b %y %H:%M";

impl DateLayout {
    /// Try to parse `raw` with this layout.
    pub fn parse(self, raw: &str) -> Option<DateTime<Utc>> {
        match self {
            DateLayout::Rfc1123 => parse_named_zone(strip_weekday(raw), RFC1123_BODY),
            DateLayout::Rfc1123Z => parse_numeric_zone(strip_weekday(raw), RFC1123_BODY),
            DateLayout::Rfc822 => parse_named_zone(raw, RFC822_BODY),
            DateLayout::Rfc822Z => parse_numeric_zone(raw, RFC822_BODY),
            DateLayout::Rfc3339 => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// Parse a publication date using the first layout that matches.
pub fn parse_published_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DATE_LAYOUTS.iter().find_map(|layout| layout.parse(raw))
}

/// Drop the leading `Mon, ` of RFC 1123 dates.
///
/// The weekday is not checked against the date; feeds get it wrong often enough.
fn strip_weekday(raw: &str) -> &str {
    match raw.split_once(',') {
        Some((day, rest)) if day.len() == 3 && day.chars().all(|c| c.is_ascii_alphabetic()) => {
            rest.trim_start()
        }
        _ => raw,
    }
}

fn parse_numeric_zone(raw: &str, body: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, &format!("{body} %z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_named_zone(raw: &str, body: &str) -> Option<DateTime<Utc>> {
    let (datetime, zone) = raw.rsplit_once(' ')?;
    let offset = zone_offset(zone)?;
    let naive = NaiveDateTime::parse_from_str(datetime.trim_end(), body).ok()?;
    naive
        .and_local_timezone(offset)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Offset of a zone abbreviation.
///
/// Unknown abbreviations are read as UTC, matching how most feed readers
/// treat them.
fn zone_offset(zone: &str) -> Option<FixedOffset> {
    if zone.is_empty() || zone.len() > 5 || !zone.chars().all(|c| c.is_ascii_uppercase()) {
        return None;
    }
    let hours = match zone {
        "EDT" => -4,
        "EST" | "CDT" => -5,
        "CST" | "MDT" => -6,
        "MST" | "PDT" => -7,
        "PST" => -8,
        _ => 0,
    };
    FixedOffset::east_opt(hours * 3600)
}

/// Why an item was not turned into a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The item has no link, or an empty one.
    MissingLink,
    /// The item has no publication date.
    MissingDate,
    /// No layout matched the publication date.
    UnparseableDate(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingLink => write!(f, "item has no link"),
            SkipReason::MissingDate => write!(f, "item has no publication date"),
            SkipReason::UnparseableDate(raw) => {
                write!(f, "unrecognized publication date '{raw}'")
            }
        }
    }
}

/// Build a post from an item, or explain why it cannot be stored.
pub fn try_normalize(item: &ParsedItem, feed_id: Uuid) -> Result<NewPost, SkipReason> {
    let url = item
        .link
        .as_deref()
        .map(str::trim)
        .filter(|link| !link.is_empty())
        .ok_or(SkipReason::MissingLink)?;

    let raw_date = item
        .published_at_raw
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or(SkipReason::MissingDate)?;

    let published_at = parse_published_at(raw_date)
        .ok_or_else(|| SkipReason::UnparseableDate(raw_date.to_string()))?;

    Ok(NewPost {
        feed_id,
        title: item.title.clone(),
        url: url.to_string(),
        description: item.description.clone(),
        published_at,
    })
}

/// Build a post from an item, logging and returning `None` when it must be skipped.
pub fn normalize_item(item: &ParsedItem, feed_id: Uuid) -> Option<NewPost> {
    match try_normalize(item, feed_id) {
        Ok(post) => Some(post),
        Err(reason) => {
            warn!(
                feed_id = %feed_id,
                link = item.link.as_deref().unwrap_or(""),
                "Skipping item: {}",
                reason
            );
            None
        }
    }
}
