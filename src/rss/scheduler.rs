//! Periodic aggregation loop.
//!
//! One feed is ingested per tick, always the least recently fetched one.
//! A cycle runs to completion before the next tick is awaited, and
//! cancellation is only observed between cycles.

use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::db::Database;
use crate::rss::fetcher::FeedSource;
use crate::rss::ingest::Ingestor;
use crate::rss::types::{Feed, IngestReport};
use crate::{GatorError, Result};

/// Longest accepted interval.
pub const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Parse an operator supplied interval such as `30s`, `1m` or `1h 30m`.
pub fn parse_interval(expr: &str) -> Result<Duration> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err(GatorError::Validation("interval must not be empty".to_string()));
    }

    let interval = humantime::parse_duration(expr)
        .map_err(|e| GatorError::Validation(format!("invalid interval '{expr}': {e}")))?;

    if interval.is_zero() {
        return Err(GatorError::Validation(format!(
            "invalid interval '{expr}': must be greater than zero"
        )));
    }

    if interval > MAX_INTERVAL {
        return Err(GatorError::Validation(format!(
            "invalid interval '{expr}': must be at most {}",
            humantime::format_duration(MAX_INTERVAL)
        )));
    }

    Ok(interval)
}

/// Time-driven aggregation loop.
pub struct Scheduler<'a> {
    ingestor: Ingestor<'a>,
    interval: Duration,
}

impl<'a> Scheduler<'a> {
    /// Create a scheduler ticking every `interval`, capped at [`MAX_INTERVAL`].
    pub fn new(db: &'a Database, source: &'a dyn FeedSource, interval: Duration) -> Self {
        Self {
            ingestor: Ingestor::new(db, source),
            interval: interval.min(MAX_INTERVAL),
        }
    }

    /// Time between ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one ingestion cycle against the least recently fetched feed.
    pub async fn tick(&self) -> Result<Option<(Feed, IngestReport)>> {
        self.ingestor.ingest_next().await
    }

    /// Run until `cancel` fires. Returns the number of cycles started.
    ///
    /// The first tick fires one full interval after start. Failed cycles
    /// are logged and the loop carries on.
    pub async fn run(&self, cancel: &CancellationToken) -> usize {
        info!(
            "Aggregation started (interval: {})",
            humantime::format_duration(self.interval)
        );

        let mut timer = interval_at(Instant::now() + self.interval, self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut cycles = 0;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = timer.tick() => {}
            }

            cycles += 1;
            match self.tick().await {
                Ok(Some((feed, _))) => debug!(feed = %feed.name, "Cycle {} complete", cycles),
                Ok(None) => debug!("No feeds to collect"),
                Err(e) => error!("Cycle {} failed: {}", cycles, e),
            }
        }

        info!("Aggregation stopped after {} cycle(s)", cycles);
        cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interval_valid() {
        assert_eq!(parse_interval("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_interval("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_interval(" 1h ").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_interval("1h 30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_interval("500ms").unwrap(), Duration::from_millis(500));
    }

    #[test]
    fn test_parse_interval_invalid() {
        for expr in ["", "   ", "abc", "10", "-1m", "1 fortnight", "300000000000y"] {
            let err = parse_interval(expr).unwrap_err();
            assert!(matches!(err, GatorError::Validation(_)), "{expr:?}");
        }
    }

    #[test]
    fn test_parse_interval_zero() {
        let err = parse_interval("0s").unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn test_parse_interval_upper_bound() {
        assert_eq!(parse_interval("365d").unwrap(), MAX_INTERVAL);
        let err = parse_interval("366d").unwrap_err();
        assert!(err.to_string().contains("at most"));
    }

    #[tokio::test]
    async fn test_cancel_before_first_tick() {
        let db = Database::open_in_memory().await.unwrap();
        let source = crate::rss::HttpFetcher::new().unwrap();
        let scheduler = Scheduler::new(&db, &source, Duration::from_secs(3600));

        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(scheduler.run(&cancel).await, 0);
    }

    #[tokio::test]
    async fn test_oversized_interval_is_capped() {
        let db = Database::open_in_memory().await.unwrap();
        let source = crate::rss::HttpFetcher::new().unwrap();
        let scheduler = Scheduler::new(&db, &source, Duration::MAX);
        assert_eq!(scheduler.interval(), MAX_INTERVAL);

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(scheduler.run(&cancel).await, 0);
    }
}
