//! User repository for gator.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::user::{NewUser, User};
use crate::{GatorError, Result};

/// Repository for user operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user.
    ///
    /// Fails with [`GatorError::Conflict`] when the name is taken.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, created_at, updated_at)
             VALUES (?, ?, ?, ?)
             RETURNING id, name, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| GatorError::from_insert(e, format!("user '{}'", new_user.name)))?;

        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by name.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, created_at, updated_at FROM users WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// List all users ordered by name.
    pub async fn list_all(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, name, created_at, updated_at FROM users ORDER BY name ASC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(users)
    }
}
