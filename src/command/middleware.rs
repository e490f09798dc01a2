//! Current-user resolution for commands that act on behalf of a user.

use crate::command::context::AppContext;
use crate::db::{User, UserRepository};
use crate::{GatorError, Result};

/// The logged-in user, resolved from the configuration and the store.
///
/// Handlers that need a user take `&CurrentUser` (or the inner `&User`);
/// the router resolves it before calling them.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// Resolve the configured current user.
    ///
    /// # Errors
    ///
    /// `Auth` when nobody is logged in or the configured name is unknown to
    /// the store. Storage failures surface as `Database`.
    pub async fn resolve(ctx: &AppContext) -> Result<Self> {
        let name = ctx
            .config
            .current_user_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                GatorError::Auth("no user logged in; run `gator login <name>`".to_string())
            })?;

        let user = UserRepository::new(ctx.db.pool())
            .get_by_name(name)
            .await?
            .ok_or_else(|| GatorError::Auth(format!("current user '{name}' does not exist")))?;

        Ok(Self(user))
    }

    /// The resolved user.
    pub fn user(&self) -> &User {
        &self.0
    }
}

impl std::ops::Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::{Database, NewUser};
    use crate::rss::HttpFetcher;
    use std::sync::Arc;

    async fn context(current: Option<&str>) -> AppContext {
        let db = Database::open_in_memory().await.unwrap();
        UserRepository::new(db.pool())
            .create(&NewUser::new("ana"))
            .await
            .unwrap();
        let mut config = Config::new("sqlite::memory:");
        config.current_user_name = current.map(str::to_string);
        AppContext::new(
            config,
            "/nonexistent/.gatorconfig.json",
            db,
            Arc::new(HttpFetcher::new().unwrap()),
        )
    }

    #[tokio::test]
    async fn test_resolve_logged_in_user() {
        let ctx = context(Some("ana")).await;
        let current = CurrentUser::resolve(&ctx).await.unwrap();
        assert_eq!(current.name, "ana");
        assert_eq!(current.user().name, "ana");
    }

    #[tokio::test]
    async fn test_resolve_without_login() {
        let ctx = context(None).await;
        let err = CurrentUser::resolve(&ctx).await.unwrap_err();
        assert!(matches!(err, GatorError::Auth(_)));
    }

    #[tokio::test]
    async fn test_resolve_unknown_user() {
        let ctx = context(Some("bob")).await;
        let err = CurrentUser::resolve(&ctx).await.unwrap_err();
        assert!(matches!(err, GatorError::Auth(_)));
        assert!(err.to_string().contains("bob"));
    }
}
