//! Database schema and migrations for gator.
//!
//! Migrations are applied sequentially when the database is first opened
//! or upgraded. Identifiers are UUIDs stored as 16-byte blobs; timestamps
//! are UTC text written by the application.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          BLOB PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
"#,
    // v2: feeds, owned by the user who added them
    r#"
CREATE TABLE feeds (
    id               BLOB PRIMARY KEY,
    name             TEXT NOT NULL,
    url              TEXT NOT NULL UNIQUE,
    user_id          BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    last_fetched_at  TEXT,                -- NULL until the first ingestion cycle
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE INDEX idx_feeds_user_id ON feeds(user_id);
CREATE INDEX idx_feeds_last_fetched_at ON feeds(last_fetched_at);
"#,
    // v3: follows
    r#"
CREATE TABLE feed_follows (
    id          BLOB PRIMARY KEY,
    user_id     BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    feed_id     BLOB NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    UNIQUE(user_id, feed_id)
);

CREATE INDEX idx_feed_follows_feed_id ON feed_follows(feed_id);
"#,
    // v4: posts, deduplicated by url
    r#"
CREATE TABLE posts (
    id            BLOB PRIMARY KEY,
    title         TEXT,
    url           TEXT NOT NULL UNIQUE,
    description   TEXT,
    published_at  TEXT NOT NULL,
    feed_id       BLOB NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE INDEX idx_posts_feed_published ON posts(feed_id, published_at);
"#,
];
