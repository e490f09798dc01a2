//! Aggregation loop tests.
//!
//! These run on the real clock with short intervals; assertions rely on
//! cancellation points rather than exact timings.

mod common;

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tokio_util::sync::CancellationToken;

use common::{add_feed, create_user, document, item, test_db, ScriptedSource};
use gator::rss::{parse_interval, FeedRepository, PostRepository, Scheduler};
use gator::GatorError;

#[tokio::test]
async fn test_no_fetch_before_first_interval() {
    let db = test_db().await;
    let ana = create_user(&db, "ana").await;
    add_feed(&db, &ana, "Blog", "https://example.test/feed.xml").await;
    let source = ScriptedSource::new();
    let scheduler = Scheduler::new(&db, &source, Duration::from_millis(500));

    let cancel = CancellationToken::new();
    let stop = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    };
    let (cycles, ()) = tokio::join!(scheduler.run(&cancel), stop);

    assert_eq!(cycles, 0);
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn test_loop_survives_failing_feed() {
    let db = test_db().await;
    let ana = create_user(&db, "ana").await;
    let down = add_feed(&db, &ana, "Down", "https://down.example.test/rss").await;
    let up = add_feed(&db, &ana, "Up", "https://up.example.test/rss").await;

    let feeds = FeedRepository::new(db.pool());
    let now = Utc::now();
    feeds
        .mark_fetched_at(down.id, now - ChronoDuration::hours(2))
        .await
        .unwrap();
    feeds
        .mark_fetched_at(up.id, now - ChronoDuration::hours(1))
        .await
        .unwrap();

    let cancel = CancellationToken::new();
    let source = ScriptedSource::new()
        .with_failure(&down.url, "connection reset")
        .with_feed(
            &up.url,
            document(
                "Up",
                vec![item("Hello", "https://up.example.test/1", "2024-01-15T10:30:00Z")],
            ),
        )
        .cancel_after(4, cancel.clone());
    let scheduler = Scheduler::new(&db, &source, Duration::from_millis(20));

    let cycles = tokio::time::timeout(Duration::from_secs(5), scheduler.run(&cancel))
        .await
        .unwrap();

    assert_eq!(cycles, 4);
    assert_eq!(
        source.calls(),
        vec![
            down.url.clone(),
            up.url.clone(),
            down.url.clone(),
            up.url.clone()
        ]
    );
    let posts = PostRepository::new(db.pool());
    assert_eq!(posts.count_by_feed(up.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_cancel_lets_current_cycle_finish() {
    let db = test_db().await;
    let ana = create_user(&db, "ana").await;
    let feed = add_feed(&db, &ana, "Slow", "https://slow.example.test/rss").await;

    let cancel = CancellationToken::new();
    let source = ScriptedSource::new()
        .with_feed(
            &feed.url,
            document(
                "Slow",
                vec![item("Late", "https://slow.example.test/1", "2024-01-15T10:30:00Z")],
            ),
        )
        .with_delay(Duration::from_millis(200))
        .cancel_after(1, cancel.clone());
    let scheduler = Scheduler::new(&db, &source, Duration::from_millis(20));

    let cycles = tokio::time::timeout(Duration::from_secs(5), scheduler.run(&cancel))
        .await
        .unwrap();

    assert_eq!(cycles, 1);
    let stored = PostRepository::new(db.pool())
        .get_by_url("https://slow.example.test/1")
        .await
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_empty_store_keeps_ticking() {
    let db = test_db().await;
    let source = ScriptedSource::new();
    let scheduler = Scheduler::new(&db, &source, Duration::from_millis(20));

    let cancel = CancellationToken::new();
    let stop = async {
        tokio::time::sleep(Duration::from_millis(150)).await;
        cancel.cancel();
    };
    let (cycles, ()) = tokio::join!(scheduler.run(&cancel), stop);

    assert!(cycles >= 2, "expected several idle cycles, got {cycles}");
    assert!(source.calls().is_empty());
}

#[test]
fn test_invalid_interval_fails_fast() {
    assert!(matches!(
        parse_interval("soon"),
        Err(GatorError::Validation(_))
    ));
    assert_eq!(parse_interval("1m").unwrap(), Duration::from_secs(60));
}
