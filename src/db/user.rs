//! User model for gator.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A registered user.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: Uuid,
    /// Display name (unique).
    pub name: String,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// New user for registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name.
    pub name: String,
}

impl NewUser {
    /// Create a new user request.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
