//! State shared by every command.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::db::Database;
use crate::rss::FeedSource;

/// Everything a command handler may touch.
///
/// Built once at startup and handed to the router; there is no global state.
pub struct AppContext {
    /// Loaded configuration. Commands that change the current user rewrite it.
    pub config: Config,
    /// Where `config` is persisted.
    pub config_path: PathBuf,
    /// Feed store.
    pub db: Database,
    /// Where feeds are fetched from.
    pub source: Arc<dyn FeedSource>,
    /// Cancelled on shutdown; stops the aggregation loop between cycles.
    pub cancel: CancellationToken,
}

impl AppContext {
    /// Create a context with a fresh cancellation token.
    pub fn new(
        config: Config,
        config_path: impl Into<PathBuf>,
        db: Database,
        source: Arc<dyn FeedSource>,
    ) -> Self {
        Self {
            config,
            config_path: config_path.into(),
            db,
            source,
            cancel: CancellationToken::new(),
        }
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("config_path", &self.config_path)
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}
