//! gator - a command-line RSS aggregator.
//!
//! Users register, follow feeds and browse the newest posts; an aggregation
//! loop keeps the post store current by fetching one feed per tick.

pub mod command;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod rss;

pub use command::{AppContext, Cli, Command, CurrentUser};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{GatorError, Result};
