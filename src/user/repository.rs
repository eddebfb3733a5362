use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::UserModel;
use crate::shared::AppError;

/// Name of the unique constraint on `users.username` (see migrations)
pub const USERNAME_UNIQUE_CONSTRAINT: &str = "users_username_key";

/// Result of attempting to create a user
#[derive(Debug, Clone)]
pub enum CreateUserResult {
    /// The user row was inserted, returns the stored record
    Created(UserModel),
    /// Another user already owns this username; nothing was written
    UsernameTaken,
}

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<UserModel>, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError>;

    /// Atomically inserts a user, reporting a username clash as `UsernameTaken`
    /// instead of an error. Two concurrent calls with the same username yield
    /// exactly one `Created`.
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<CreateUserResult, AppError>;
}

#[derive(Default)]
struct UserTable {
    users: HashMap<i64, UserModel>,
    last_id: i64,
}

/// In-memory implementation of UserRepository for development and testing
#[derive(Default)]
pub struct InMemoryUserRepository {
    table: Mutex<UserTable>,
}

impl InMemoryUserRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current number of users in the repository
    pub async fn user_count(&self) -> usize {
        self.table.lock().await.users.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<UserModel>, AppError> {
        debug!(user_id = id, "Fetching user by id from memory");

        let table = self.table.lock().await;
        Ok(table.users.get(&id).cloned())
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError> {
        debug!(username = %username, "Fetching user by username from memory");

        let table = self.table.lock().await;
        let user = table
            .users
            .values()
            .find(|user| user.username == username)
            .cloned();

        Ok(user)
    }

    #[instrument(skip(self, password_hash))]
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<CreateUserResult, AppError> {
        debug!(username = %username, "Creating user in memory");

        // Check and insert under the same guard, the in-memory stand-in for a unique index
        let mut table = self.table.lock().await;
        if table.users.values().any(|user| user.username == username) {
            warn!(username = %username, "Username already exists in memory");
            return Ok(CreateUserResult::UsernameTaken);
        }

        table.last_id += 1;
        let user = UserModel::new(
            table.last_id,
            username.to_string(),
            password_hash.to_string(),
        );
        table.users.insert(user.id, user.clone());

        debug!(user_id = user.id, "User created successfully in memory");
        Ok(CreateUserResult::Created(user))
    }
}

/// PostgreSQL implementation of user repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// True when the insert was rejected by the username unique constraint.
/// Violations of any other constraint stay infrastructure faults.
fn is_username_conflict(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => {
            db_error.is_unique_violation()
                && db_error.constraint() == Some(USERNAME_UNIQUE_CONSTRAINT)
        }
        _ => false,
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<UserModel>, AppError> {
        debug!(user_id = id, "Fetching user by id from database");

        sqlx::query_as::<_, UserModel>(
            "SELECT id, username, password_hash, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = id, "Failed to fetch user from database");
            AppError::DatabaseError(e.to_string())
        })
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError> {
        debug!(username = %username, "Fetching user by username from database");

        sqlx::query_as::<_, UserModel>(
            "SELECT id, username, password_hash, created_at, updated_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, username = %username, "Failed to fetch user from database");
            AppError::DatabaseError(e.to_string())
        })
    }

    #[instrument(skip(self, password_hash))]
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<CreateUserResult, AppError> {
        debug!(username = %username, "Creating user in database");

        let inserted = sqlx::query_as::<_, UserModel>(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) \
             RETURNING id, username, password_hash, created_at, updated_at",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(user) => {
                debug!(user_id = user.id, "User created successfully in database");
                Ok(CreateUserResult::Created(user))
            }
            Err(e) if is_username_conflict(&e) => {
                warn!(username = %username, "Username already exists in database");
                Ok(CreateUserResult::UsernameTaken)
            }
            Err(e) => {
                warn!(error = %e, "Failed to create user in database");
                Err(AppError::DatabaseError(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Arc;

    fn created(result: CreateUserResult) -> UserModel {
        match result {
            CreateUserResult::Created(user) => user,
            CreateUserResult::UsernameTaken => panic!("Expected user to be created"),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let repo = InMemoryUserRepository::new();

        let user = created(repo.create_user("alice", "hash-a").await.unwrap());
        assert_eq!(user.username, "alice");
        assert_eq!(user.password_hash, "hash-a");

        let by_id = repo.find_by_id(user.id).await.unwrap();
        assert_eq!(by_id, Some(user.clone()));

        let by_name = repo.find_by_username("alice").await.unwrap();
        assert_eq!(by_name, Some(user));
    }

    #[tokio::test]
    async fn test_ids_are_unique_and_increasing() {
        let repo = InMemoryUserRepository::new();

        let first = created(repo.create_user("alice", "h").await.unwrap());
        let second = created(repo.create_user("bob", "h").await.unwrap());

        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_reported_not_stored() {
        let repo = InMemoryUserRepository::new();

        created(repo.create_user("alice", "first").await.unwrap());
        let result = repo.create_user("alice", "second").await.unwrap();

        assert!(matches!(result, CreateUserResult::UsernameTaken));
        assert_eq!(repo.user_count().await, 1);
        let stored = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "first");
    }

    #[tokio::test]
    async fn test_username_lookup_is_case_sensitive() {
        let repo = InMemoryUserRepository::new();
        created(repo.create_user("Alice", "h").await.unwrap());

        assert!(repo.find_by_username("alice").await.unwrap().is_none());
        let result = repo.create_user("alice", "h").await.unwrap();
        assert!(matches!(result, CreateUserResult::Created(_)));
    }

    #[tokio::test]
    async fn test_find_missing_user() {
        let repo = InMemoryUserRepository::new();

        assert!(repo.find_by_id(42).await.unwrap().is_none());
        assert!(repo.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_creates_yield_one_user() {
        let repo = Arc::new(InMemoryUserRepository::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.create_user("racer", "h").await.unwrap() })
            })
            .collect();

        let mut created_count = 0;
        for handle in handles {
            if let CreateUserResult::Created(_) = handle.await.unwrap() {
                created_count += 1;
            }
        }

        assert_eq!(created_count, 1);
        assert_eq!(repo.user_count().await, 1);
    }

    #[test]
    fn test_non_database_errors_are_not_conflicts() {
        assert!(!is_username_conflict(&sqlx::Error::RowNotFound));
        assert!(!is_username_conflict(&sqlx::Error::PoolTimedOut));
    }
}
