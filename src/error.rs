//! Error types for gator.

use thiserror::Error;

/// Common error type for gator.
#[derive(Error, Debug)]
pub enum GatorError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant unless a repository
    /// recognises them as a user-facing conflict.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error (unreadable file, bad connection string).
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for operator input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The command needs a logged-in user and none could be resolved.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Unique key already taken.
    #[error("{0} already exists")]
    Conflict(String),

    /// Network, HTTP or XML failure while fetching a feed.
    #[error("fetch error: {0}")]
    Fetch(String),
}

impl From<sqlx::Error> for GatorError {
    fn from(e: sqlx::Error) -> Self {
        GatorError::Database(e.to_string())
    }
}

impl GatorError {
    /// Map a sqlx error, turning unique violations into [`GatorError::Conflict`].
    pub(crate) fn from_insert(e: sqlx::Error, what: impl Into<String>) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                GatorError::Conflict(what.into())
            }
            _ => GatorError::Database(e.to_string()),
        }
    }
}

/// Result type alias for gator operations.
pub type Result<T> = std::result::Result<T, GatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        let err = GatorError::Auth("no user logged in".to_string());
        assert_eq!(err.to_string(), "authentication error: no user logged in");
    }

    #[test]
    fn test_validation_error_display() {
        let err = GatorError::Validation("missing argument <name>".to_string());
        assert_eq!(err.to_string(), "validation error: missing argument <name>");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = GatorError::NotFound("feed".to_string());
        assert_eq!(err.to_string(), "feed not found");
    }

    #[test]
    fn test_conflict_error_display() {
        let err = GatorError::Conflict("user 'ana'".to_string());
        assert_eq!(err.to_string(), "user 'ana' already exists");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GatorError = io_err.into();
        assert!(matches!(err, GatorError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_non_unique_sqlx_error_is_database() {
        let err = GatorError::from_insert(sqlx::Error::RowNotFound, "post");
        assert!(matches!(err, GatorError::Database(_)));
    }

    #[test]
    fn test_fetch_error_display() {
        let err = GatorError::Fetch("HTTP error: 500".to_string());
        assert_eq!(err.to_string(), "fetch error: HTTP error: 500");
    }
}
