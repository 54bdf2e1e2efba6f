//! Session tokens backed by server-side session rows
//!
//! A token is an HS256 JWT naming a user and a session row. It is only
//! accepted while the signature is valid, the row still exists, the row
//! belongs to that user and has not expired. Logging out deletes the row,
//! which revokes every copy of the token.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::{ApiError, ApiResult},
    models::{Session, User},
    repositories::{SessionRepository, UserRepository},
};

/// Upper bound on session lifetime (ten years)
const MAX_TTL_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// Session token settings
#[derive(Clone)]
pub struct SessionConfig {
    pub secret: Vec<u8>,
    pub ttl: Duration,
}

impl SessionConfig {
    /// Build settings from the service configuration
    ///
    /// Falls back to a random per-process secret when none (or a short one)
    /// is configured; sessions then do not survive a restart.
    pub fn from_app_config(config: &AppConfig) -> Self {
        let secret = match config.usable_session_secret() {
            Some(secret) => secret.as_bytes().to_vec(),
            None => {
                if config.session_secret.is_some() {
                    warn!("Configured session secret is too short, ignoring it");
                }
                warn!("No session secret configured, using a random one");
                let mut secret = vec![0u8; 32];
                rand::thread_rng().fill_bytes(&mut secret);
                secret
            }
        };

        let ttl_seconds = config.session_ttl_seconds.min(MAX_TTL_SECONDS);

        Self {
            secret,
            ttl: Duration::seconds(ttl_seconds as i64),
        }
    }
}

/// Session token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: i64,
    /// Session ID
    pub sid: Uuid,
    /// Issued at time
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

/// Freshly opened session and its token
#[derive(Debug)]
pub struct IssuedSession {
    pub token: String,
    pub session: Session,
}

/// Session service
#[derive(Clone)]
pub struct SessionService {
    sessions: SessionRepository,
    users: UserRepository,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionService {
    pub fn new(config: SessionConfig, sessions: SessionRepository, users: UserRepository) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            sessions,
            users,
            encoding_key: EncodingKey::from_secret(&config.secret),
            decoding_key: DecodingKey::from_secret(&config.secret),
            validation,
            ttl: config.ttl,
        }
    }

    /// Open a session for an authenticated user
    pub async fn start(&self, user: &User) -> ApiResult<IssuedSession> {
        let pruned = self.sessions.delete_expired(Utc::now()).await?;
        if pruned > 0 {
            debug!("Pruned {} expired sessions", pruned);
        }

        let session = self.sessions.create(user.id, self.ttl).await?;
        let token = self.encode_token(&session)?;

        info!("Opened session {} for user {}", session.id, user.id);
        Ok(IssuedSession { token, session })
    }

    /// Resolve a token to its user and session
    pub async fn resolve(&self, token: &str) -> ApiResult<(User, Session)> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Rejected session token: {}", e);
                ApiError::Unauthenticated
            })?
            .claims;

        let session = self
            .sessions
            .find(claims.sid)
            .await?
            .ok_or(ApiError::Unauthenticated)?;

        if session.user_id != claims.sub {
            warn!("Session {} presented for the wrong user", session.id);
            return Err(ApiError::Unauthenticated);
        }

        if session.is_expired(Utc::now()) {
            self.sessions.delete(session.id).await?;
            return Err(ApiError::Unauthenticated);
        }

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(ApiError::Unauthenticated)?;

        Ok((user, session))
    }

    /// Close a session
    pub async fn end(&self, session_id: Uuid) -> ApiResult<bool> {
        let deleted = self.sessions.delete(session_id).await?;
        if deleted {
            info!("Closed session {}", session_id);
        }
        Ok(deleted)
    }

    fn encode_token(&self, session: &Session) -> ApiResult<String> {
        let claims = Claims {
            sub: session.user_id,
            sid: session.id,
            iat: session.created_at.timestamp(),
            exp: session.expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("Failed to sign session token: {}", e)))
    }
}
