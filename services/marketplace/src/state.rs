//! Application state shared across handlers

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::{
    config::AppConfig,
    repositories::{ListingRepository, MessageRepository, SessionRepository, UserRepository},
    session::{SessionConfig, SessionService},
    uploads::UploadStore,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub user_repository: UserRepository,
    pub listing_repository: ListingRepository,
    pub message_repository: MessageRepository,
    pub sessions: SessionService,
    pub uploads: UploadStore,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wire repositories and services around a migrated pool
    pub fn new(pool: SqlitePool, uploads: UploadStore, config: AppConfig) -> Self {
        let user_repository = UserRepository::new(pool.clone());
        let sessions = SessionService::new(
            SessionConfig::from_app_config(&config),
            SessionRepository::new(pool.clone()),
            user_repository.clone(),
        );

        Self {
            listing_repository: ListingRepository::new(pool.clone()),
            message_repository: MessageRepository::new(pool.clone()),
            user_repository,
            sessions,
            uploads,
            config: Arc::new(config),
            db_pool: pool,
        }
    }
}
