//! User repository
//!
//! Lookups used by the login flow and the user administration routes. The
//! password hash never leaves this module except through
//! [`UserRepository::get_user_with_password`].

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::instrument;

use crate::domain::{NewUser, UpdateUser, User, UserId, UserRole};
use crate::errors::{Error, Result};
use crate::storage::DbPool;

const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<(User, String)> {
        let role = UserRole::from_str(&self.role)
            .map_err(|_| Error::internal(format!("Unknown user role '{}'", self.role)))?;

        let user = User {
            id: UserId::from_string(self.id),
            username: self.username,
            email: self.email,
            role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        Ok((user, self.password_hash))
    }
}

/// Postgres `unique_violation`.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code.as_ref() == "23505")
}

fn write_error(err: sqlx::Error, context: &str) -> Error {
    if is_unique_violation(&err) {
        return Error::conflict("Username or email already exists");
    }
    Error::database(err, context)
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Get a user by ID
    async fn get_user(&self, id: &UserId) -> Result<Option<User>>;

    /// Get a user with their password hash for authentication
    async fn get_user_with_password(&self, username: &str) -> Result<Option<(User, String)>>;

    /// Merge `update` into the stored user; `NotFound` if no row matched
    async fn update_user(&self, id: &UserId, update: UpdateUser) -> Result<User>;

    /// List users ordered by creation time
    async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>>;

    /// Delete a user; `NotFound` if no row matched
    async fn delete_user(&self, id: &UserId) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct SqlxUserRepository {
    pool: DbPool,
}

impl SqlxUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id, username = %user.username), name = "db_create_user")]
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.as_str())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| write_error(err, "Failed to create user"))?;

        self.get_user(&user.id)
            .await?
            .ok_or_else(|| Error::internal("User not found after creation"))
    }

    #[instrument(skip(self), fields(user_id = %id), name = "db_get_user")]
    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to fetch user"))?;

        row.map(|r| r.into_user().map(|(user, _)| user)).transpose()
    }

    #[instrument(skip(self), name = "db_get_user_with_password")]
    async fn get_user_with_password(&self, username: &str) -> Result<Option<(User, String)>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to fetch user for authentication"))?;

        row.map(UserRow::into_user).transpose()
    }

    #[instrument(skip(self, update), fields(user_id = %id), name = "db_update_user")]
    async fn update_user(&self, id: &UserId, update: UpdateUser) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to fetch user for update"))?
        .ok_or_else(|| Error::not_found("User", id))?;
        let (current, current_hash) = row.into_user()?;

        let username = update.username.unwrap_or(current.username);
        let email = update.email.unwrap_or(current.email);
        let password_hash = update.password_hash.unwrap_or(current_hash);
        let role = update.role.unwrap_or(current.role);

        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $1, email = $2, password_hash = $3, role = $4, updated_at = $5
            WHERE id = $6
            "#,
        )
        .bind(&username)
        .bind(&email)
        .bind(&password_hash)
        .bind(role.as_str())
        .bind(Utc::now())
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|err| write_error(err, "Failed to update user"))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("User", id));
        }

        self.get_user(id).await?.ok_or_else(|| Error::not_found("User", id))
    }

    #[instrument(skip(self), name = "db_list_users")]
    async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2",
            USER_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to list users"))?;

        rows.into_iter().map(|r| r.into_user().map(|(user, _)| user)).collect()
    }

    #[instrument(skip(self), fields(user_id = %id), name = "db_delete_user")]
    async fn delete_user(&self, id: &UserId) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to delete user"))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("User", id));
        }
        Ok(())
    }
}
