//! Repositories for database operations

pub mod listing;
pub mod message;
pub mod session;
pub mod user;

pub use listing::ListingRepository;
pub use message::MessageRepository;
pub use session::SessionRepository;
pub use user::UserRepository;

/// Fresh in-memory database with the schema applied
#[cfg(test)]
pub(crate) async fn test_pool() -> sqlx::SqlitePool {
    let pool = common::database::init_memory_pool().await.unwrap();
    crate::run_migrations(&pool).await.unwrap();
    pool
}
