//! Command-line surface: argument parsing and routing.

pub mod context;
pub mod handlers;
pub mod middleware;

pub use context::AppContext;
pub use middleware::CurrentUser;

use std::io::Write;

use clap::{Parser, Subcommand};

use crate::Result;

/// gator: a command-line RSS aggregator.
#[derive(Debug, Parser)]
#[command(name = "gator", version, about = "Command-line RSS aggregator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Commands understood by gator.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Create a user and log in as them.
    Register { name: String },
    /// Switch the current user.
    Login { name: String },
    /// Delete all users, feeds, follows and posts.
    Reset,
    /// List registered users.
    Users,
    /// Add a feed and follow it.
    #[command(name = "addfeed")]
    AddFeed { name: String, url: String },
    /// List all feeds.
    Feeds,
    /// Follow an existing feed by URL.
    Follow { url: String },
    /// List the feeds the current user follows.
    Following,
    /// Stop following a feed.
    Unfollow { url: String },
    /// Show the newest posts from followed feeds.
    Browse {
        /// Number of posts to show (default 2).
        limit: Option<String>,
    },
    /// Fetch feeds continuously, one per interval (e.g. `30s`, `1m`).
    Agg { interval: String },
    /// Fetch one feed now: the given URL, or the least recently fetched feed.
    Fetch { url: Option<String> },
}

impl Command {
    /// Whether the command acts on behalf of the logged-in user.
    pub fn requires_user(&self) -> bool {
        matches!(
            self,
            Command::AddFeed { .. }
                | Command::Follow { .. }
                | Command::Following
                | Command::Unfollow { .. }
                | Command::Browse { .. }
        )
    }
}

/// Route a parsed command to its handler.
///
/// User-aware commands get the current user resolved first; resolution
/// failures abort the command before the handler runs.
pub async fn dispatch(ctx: &mut AppContext, command: Command, out: &mut dyn Write) -> Result<()> {
    let user = if command.requires_user() {
        Some(CurrentUser::resolve(ctx).await?)
    } else {
        None
    };

    match (command, user) {
        (Command::Register { name }, _) => handlers::register(ctx, &name, out).await,
        (Command::Login { name }, _) => handlers::login(ctx, &name, out).await,
        (Command::Reset, _) => handlers::reset(ctx, out).await,
        (Command::Users, _) => handlers::users(ctx, out).await,
        (Command::Feeds, _) => handlers::feeds(ctx, out).await,
        (Command::Agg { interval }, _) => handlers::agg(ctx, &interval, out).await,
        (Command::Fetch { url }, _) => handlers::fetch(ctx, url.as_deref(), out).await,
        (Command::AddFeed { name, url }, Some(user)) => {
            handlers::add_feed(ctx, &user, &name, &url, out).await
        }
        (Command::Follow { url }, Some(user)) => handlers::follow(ctx, &user, &url, out).await,
        (Command::Following, Some(user)) => handlers::following(ctx, &user, out).await,
        (Command::Unfollow { url }, Some(user)) => {
            handlers::unfollow(ctx, &user, &url, out).await
        }
        (Command::Browse { limit }, Some(user)) => {
            handlers::browse(ctx, &user, limit.as_deref(), out).await
        }
        (command, None) => Err(crate::GatorError::Auth(format!(
            "{command:?} requires a logged-in user"
        ))),
    }
}
