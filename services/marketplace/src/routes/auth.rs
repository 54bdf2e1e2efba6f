//! Registration, login and session routes

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use common::error::DatabaseError;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult},
    middleware::{CurrentUser, SESSION_COOKIE},
    models::{LoginRequest, LoginResponse, RegisterRequest, UserResponse},
    repositories::user::hash_password,
    state::AppState,
    validation::validate_registration,
};

const USERNAME_TAKEN: &str = "Username already exists";
const EMAIL_TAKEN: &str = "Email already registered";

/// Map a lost uniqueness race onto the same error the pre-check gives
fn registration_conflict(err: DatabaseError) -> ApiError {
    if !err.is_unique_violation() {
        return err.into();
    }

    if err
        .driver_message()
        .is_some_and(|message| message.contains("users.email"))
    {
        ApiError::Validation(EMAIL_TAKEN.to_string())
    } else {
        ApiError::Validation(USERNAME_TAKEN.to_string())
    }
}

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let new_user = validate_registration(payload).map_err(ApiError::Validation)?;

    if state
        .user_repository
        .find_by_username(&new_user.username)
        .await?
        .is_some()
    {
        warn!("Username {} already exists", new_user.username);
        return Err(ApiError::Validation(USERNAME_TAKEN.to_string()));
    }

    if state
        .user_repository
        .find_by_email(&new_user.email)
        .await?
        .is_some()
    {
        warn!("Email {} already registered", new_user.email);
        return Err(ApiError::Validation(EMAIL_TAKEN.to_string()));
    }

    let password_hash = hash_password(&new_user.password)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;

    let user = state
        .user_repository
        .create(&new_user, &password_hash)
        .await
        .map_err(registration_conflict)?;

    info!("User registered: {}", user.username);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": UserResponse::from(&user),
        })),
    ))
}

/// Log in and open a session
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;

    let candidate = state
        .user_repository
        .find_by_username(payload.username.trim())
        .await?;

    let user = state
        .user_repository
        .check_login(candidate, &payload.password)
        .ok_or_else(|| {
            warn!("Failed login attempt for {:?}", payload.username);
            ApiError::InvalidCredentials
        })?;

    let issued = state.sessions.start(&user).await?;

    let cookie = Cookie::build((SESSION_COOKIE, issued.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    let body = LoginResponse {
        message: "Logged in successfully".to_string(),
        user: UserResponse::from(&user),
        token: issued.token,
        expires_at: issued.session.expires_at,
    };

    Ok((jar.add(cookie), Json(body)))
}

/// Close the current session
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    state.sessions.end(current.session_id).await?;
    info!("User {} logged out", current.username);

    // Sent even when the request authenticated with a bearer token
    let mut removal = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    removal.make_removal();
    let jar = jar.add(removal);

    Ok((jar, Json(json!({ "message": "Logged out successfully" }))))
}

/// Public fields of the logged-in user
pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse {
        id: current.id,
        username: current.username,
        email: current.email,
    })
}
