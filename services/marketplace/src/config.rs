//! Service configuration
//!
//! Values come from an optional `marketplace.toml` in the working directory,
//! overridden by `MARKETPLACE_*` environment variables. Every field has a
//! default so the service starts with no configuration at all.

use serde::Deserialize;
use std::path::PathBuf;

/// Shortest session secret accepted from configuration
pub const MIN_SECRET_LEN: usize = 32;

/// Marketplace service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Directory holding uploaded attachments
    pub upload_dir: PathBuf,
    /// Single origin allowed by CORS
    pub cors_origin: String,
    /// HMAC secret for session tokens; random per process when unset
    pub session_secret: Option<String>,
    /// Session lifetime in seconds
    pub session_ttl_seconds: u64,
    /// Create the seed account when the user table is empty
    pub seed_enabled: bool,
    pub seed_username: String,
    pub seed_email: String,
    pub seed_password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            cors_origin: "http://localhost:3000".to_string(),
            session_secret: None,
            session_ttl_seconds: 60 * 60 * 24,
            seed_enabled: true,
            seed_username: "testuser".to_string(),
            seed_email: "test@example.com".to_string(),
            seed_password: "testpassword".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `marketplace.toml` and the environment
    ///
    /// # Environment Variables
    /// - `MARKETPLACE_BIND_ADDRESS` (default: `0.0.0.0:5000`)
    /// - `MARKETPLACE_UPLOAD_DIR` (default: `uploads`)
    /// - `MARKETPLACE_CORS_ORIGIN` (default: `http://localhost:3000`)
    /// - `MARKETPLACE_SESSION_SECRET` (at least 32 bytes)
    /// - `MARKETPLACE_SESSION_TTL_SECONDS` (default: 86400)
    /// - `MARKETPLACE_SEED_ENABLED`, `MARKETPLACE_SEED_USERNAME`,
    ///   `MARKETPLACE_SEED_EMAIL`, `MARKETPLACE_SEED_PASSWORD`
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("marketplace").required(false))
            .add_source(config::Environment::with_prefix("MARKETPLACE").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Configured session secret, if it is long enough to use
    pub fn usable_session_secret(&self) -> Option<&str> {
        self.session_secret
            .as_deref()
            .filter(|secret| secret.len() >= MIN_SECRET_LEN)
    }
}
