//! Marketplace backend
//!
//! Users register and log in, publish listings with image and video
//! attachments, and message each other about listings. Everything is served
//! as a JSON HTTP API from a single SQLite database and a local upload
//! directory.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod session;
pub mod state;
pub mod uploads;
pub mod validation;

use common::error::{DatabaseError, DatabaseResult};
use sqlx::SqlitePool;
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    models::{NewUser, User},
    repositories::user::hash_password,
    state::AppState,
};

/// Apply the embedded schema migrations
pub async fn run_migrations(pool: &SqlitePool) -> DatabaseResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))
}

/// Create the configured seed account if no user exists yet
pub async fn seed_default_user(state: &AppState) -> ApiResult<Option<User>> {
    let config = &state.config;
    if !config.seed_enabled || state.user_repository.count().await? > 0 {
        return Ok(None);
    }

    let seed = NewUser {
        username: config.seed_username.clone(),
        email: config.seed_email.clone(),
        password: config.seed_password.clone(),
    };
    let password_hash = hash_password(&seed.password)
        .map_err(|e| ApiError::Internal(format!("Failed to hash seed password: {}", e)))?;

    let user = state.user_repository.create(&seed, &password_hash).await?;
    info!("Seeded account {}", user.username);

    Ok(Some(user))
}
