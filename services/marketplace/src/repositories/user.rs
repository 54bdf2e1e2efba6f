//! User repository for database operations

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{self, SaltString},
};
use chrono::Utc;
use common::error::DatabaseResult;
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::OnceLock;
use tracing::info;

use crate::models::{NewUser, User};

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Hash verified in place of a real one when the username is unknown
fn dummy_hash() -> Option<&'static str> {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    DUMMY_HASH
        .get_or_init(|| hash_password("unknown-user-placeholder").ok())
        .as_deref()
}

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user whose password has already been hashed
    pub async fn create(&self, new_user: &NewUser, password_hash: &str) -> DatabaseResult<User> {
        info!("Creating new user: {}", new_user.username);

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by email
    pub async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Check a user ID inside an open transaction
    pub async fn exists(conn: &mut SqliteConnection, id: i64) -> DatabaseResult<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(found.is_some())
    }

    pub async fn count(&self) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Verify a user's password
    ///
    /// An unparsable stored hash counts as a mismatch.
    pub fn verify_password(&self, user: &User, password: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&user.password_hash) else {
            tracing::error!("Stored password hash for user {} is malformed", user.id);
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Check a login attempt against the looked-up account
    ///
    /// An unknown username still pays for one Argon2 verification, so the
    /// two failure cases take about as long.
    pub fn check_login(&self, candidate: Option<User>, password: &str) -> Option<User> {
        match candidate {
            Some(user) => self.verify_password(&user, password).then_some(user),
            None => {
                if let Some(parsed_hash) =
                    dummy_hash().and_then(|hash| PasswordHash::new(hash).ok())
                {
                    let _ = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_pool;

    fn alice() -> NewUser {
        NewUser {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "wonderland".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let repo = UserRepository::new(test_pool().await);
        let hash = hash_password("wonderland").unwrap();

        let created = repo.create(&alice(), &hash).await.unwrap();
        assert!(created.password_hash.starts_with("$argon2"));

        let by_name = repo.find_by_username("alice").await.unwrap().unwrap();
        let by_email = repo.find_by_email("alice@example.com").await.unwrap().unwrap();
        let by_id = repo.find_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(by_name.id, created.id);
        assert_eq!(by_email.id, created.id);
        assert_eq!(by_id.username, "alice");
        assert!(repo.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_unique_violation() {
        let repo = UserRepository::new(test_pool().await);
        let hash = hash_password("wonderland").unwrap();
        repo.create(&alice(), &hash).await.unwrap();

        let duplicate = NewUser {
            email: "other@example.com".to_string(),
            ..alice()
        };
        let err = repo.create(&duplicate, &hash).await.unwrap_err();

        assert!(err.is_unique_violation());
        assert!(err.driver_message().unwrap().contains("users.username"));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_password_verification() {
        let repo = UserRepository::new(test_pool().await);
        let hash = hash_password("wonderland").unwrap();
        let user = repo.create(&alice(), &hash).await.unwrap();

        assert!(repo.verify_password(&user, "wonderland"));
        assert!(!repo.verify_password(&user, "Wonderland"));

        let broken = User {
            password_hash: "not-a-hash".to_string(),
            ..user
        };
        assert!(!repo.verify_password(&broken, "wonderland"));
    }

    #[tokio::test]
    async fn test_check_login() {
        let repo = UserRepository::new(test_pool().await);
        let hash = hash_password("wonderland").unwrap();
        repo.create(&alice(), &hash).await.unwrap();

        let found = repo.find_by_username("alice").await.unwrap();
        assert!(repo.check_login(found.clone(), "wonderland").is_some());
        assert!(repo.check_login(found, "looking-glass").is_none());

        // Unknown users are verified against the placeholder hash
        assert!(repo.check_login(None, "wonderland").is_none());
        assert!(PasswordHash::new(dummy_hash().unwrap()).is_ok());
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("same password").unwrap();
        let second = hash_password("same password").unwrap();
        assert_ne!(first, second);
    }
}
