//! Command handlers.
//!
//! Output goes to the writer the router hands in; diagnostics go through
//! `tracing` to stderr.

use std::io::Write;

use tracing::info;

use crate::command::context::AppContext;
use crate::command::middleware::CurrentUser;
use crate::db::{NewUser, UserRepository};
use crate::rss::{
    parse_browse_limit, parse_interval, FeedService, IngestReport, Ingestor, Scheduler,
};
use crate::{GatorError, Result};

fn require_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GatorError::Validation("user name must not be empty".to_string()));
    }
    Ok(name)
}

/// `register <name>`: create a user and log in as them.
pub async fn register(ctx: &mut AppContext, name: &str, out: &mut dyn Write) -> Result<()> {
    let name = require_name(name)?;
    let user = UserRepository::new(ctx.db.pool())
        .create(&NewUser::new(name))
        .await?;
    ctx.config.set_user(&user.name, &ctx.config_path)?;

    info!(user = %user.name, id = %user.id, "User registered");
    writeln!(out, "User created: {}", user.name)?;
    Ok(())
}

/// `login <name>`: switch the current user.
pub async fn login(ctx: &mut AppContext, name: &str, out: &mut dyn Write) -> Result<()> {
    let name = require_name(name)?;
    let user = UserRepository::new(ctx.db.pool())
        .get_by_name(name)
        .await?
        .ok_or_else(|| GatorError::NotFound(format!("user '{name}'")))?;
    ctx.config.set_user(&user.name, &ctx.config_path)?;

    writeln!(out, "User has been set to {}", user.name)?;
    Ok(())
}

/// `reset`: delete every user, feed, follow and post.
pub async fn reset(ctx: &AppContext, out: &mut dyn Write) -> Result<()> {
    ctx.db.reset().await?;
    writeln!(out, "Database has been reset")?;
    Ok(())
}

/// `users`: list users, marking the current one.
pub async fn users(ctx: &AppContext, out: &mut dyn Write) -> Result<()> {
    let current = ctx.config.current_user_name.as_deref();
    for user in UserRepository::new(ctx.db.pool()).list_all().await? {
        if Some(user.name.as_str()) == current {
            writeln!(out, "* {} (current)", user.name)?;
        } else {
            writeln!(out, "* {}", user.name)?;
        }
    }
    Ok(())
}

/// `addfeed <name> <url>`: register a feed and follow it.
pub async fn add_feed(
    ctx: &AppContext,
    user: &CurrentUser,
    name: &str,
    url: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let (feed, follow) = FeedService::new(&ctx.db).add_feed(user, name, url).await?;

    writeln!(out, "Feed added: {} ({})", feed.name, feed.url)?;
    writeln!(out, "{} is now following {}", follow.user_name, follow.feed_name)?;
    Ok(())
}

/// `feeds`: list every feed with its creator.
pub async fn feeds(ctx: &AppContext, out: &mut dyn Write) -> Result<()> {
    for feed in FeedService::new(&ctx.db).list_feeds().await? {
        writeln!(out, "* {} ({}) added by {}", feed.name, feed.url, feed.user_name)?;
    }
    Ok(())
}

/// `follow <url>`.
pub async fn follow(
    ctx: &AppContext,
    user: &CurrentUser,
    url: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let follow = FeedService::new(&ctx.db).follow(user, url).await?;
    writeln!(out, "{} is now following {}", follow.user_name, follow.feed_name)?;
    Ok(())
}

/// `following`.
pub async fn following(ctx: &AppContext, user: &CurrentUser, out: &mut dyn Write) -> Result<()> {
    let follows = FeedService::new(&ctx.db).following(user).await?;
    if follows.is_empty() {
        writeln!(out, "{} is not following any feeds", user.name)?;
        return Ok(());
    }
    for follow in follows {
        writeln!(out, "* {}", follow.feed_name)?;
    }
    Ok(())
}

/// `unfollow <url>`.
pub async fn unfollow(
    ctx: &AppContext,
    user: &CurrentUser,
    url: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let feed = FeedService::new(&ctx.db).unfollow(user, url).await?;
    writeln!(out, "{} unfollowed {}", user.name, feed.name)?;
    Ok(())
}

/// `browse [limit]`: newest posts from followed feeds.
pub async fn browse(
    ctx: &AppContext,
    user: &CurrentUser,
    limit: Option<&str>,
    out: &mut dyn Write,
) -> Result<()> {
    let limit = parse_browse_limit(limit);
    let posts = FeedService::new(&ctx.db).browse(user, limit).await?;
    if posts.is_empty() {
        writeln!(out, "No posts yet")?;
        return Ok(());
    }

    for post in posts {
        writeln!(
            out,
            "{} from {}",
            post.published_at.format("%a %b %e %Y %H:%M"),
            post.feed_name
        )?;
        writeln!(out, "--- {} ---", post.title.as_deref().unwrap_or("(untitled)"))?;
        if let Some(description) = post.description.as_deref().filter(|d| !d.is_empty()) {
            writeln!(out, "    {description}")?;
        }
        writeln!(out, "Link: {}", post.url)?;
        writeln!(out, "=====================================")?;
    }
    Ok(())
}

fn print_report(out: &mut dyn Write, feed_name: &str, report: &IngestReport) -> Result<()> {
    writeln!(
        out,
        "Fetched {}: {} new post(s), {} already stored, {} skipped",
        feed_name, report.stored, report.duplicates, report.skipped
    )?;
    Ok(())
}

/// `fetch [url]`: run one ingestion cycle now.
///
/// Without a URL the least recently fetched feed is used, as the
/// aggregation loop would.
pub async fn fetch(ctx: &AppContext, url: Option<&str>, out: &mut dyn Write) -> Result<()> {
    let ingestor = Ingestor::new(&ctx.db, ctx.source.as_ref());

    match url {
        Some(url) => {
            let feed = FeedService::new(&ctx.db).get_feed_by_url(url).await?;
            let report = ingestor.ingest(&feed).await?;
            print_report(out, &feed.name, &report)
        }
        None => match ingestor.ingest_next().await? {
            Some((feed, report)) => print_report(out, &feed.name, &report),
            None => {
                writeln!(out, "No feeds to fetch")?;
                Ok(())
            }
        },
    }
}

/// `agg <interval>`: run the aggregation loop until cancelled.
pub async fn agg(ctx: &AppContext, interval: &str, out: &mut dyn Write) -> Result<()> {
    let interval = parse_interval(interval)?;
    writeln!(
        out,
        "Collecting feeds every {}",
        humantime::format_duration(interval)
    )?;
    out.flush()?;

    Scheduler::new(&ctx.db, ctx.source.as_ref(), interval)
        .run(&ctx.cancel)
        .await;
    Ok(())
}
