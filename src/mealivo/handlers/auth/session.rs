//! Access token cookie handling and request authentication.

use axum::{
    http::{
        header::{InvalidHeaderValue, AUTHORIZATION},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use sqlx::PgPool;
use tracing::{debug, error};

use super::state::{AuthConfig, AuthState};
use crate::mealivo::{
    handlers::message,
    storage::users::{self, UserRecord},
};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Build the `HttpOnly` cookie carrying the access token.
pub(super) fn access_cookie(
    auth_config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = auth_config.access_token_ttl_seconds();
    let mut cookie = format!(
        "{ACCESS_TOKEN_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if auth_config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(super) fn clear_access_cookie(
    auth_config: &AuthConfig,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{ACCESS_TOKEN_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if auth_config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Bearer header first, then the `accessToken` cookie.
pub(crate) fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    CookieJar::from_headers(headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|token| !token.is_empty())
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Resolve the caller into a user row or the response explaining why not.
pub(crate) async fn authenticate(
    headers: &HeaderMap,
    pool: &PgPool,
    auth_state: &AuthState,
) -> Result<UserRecord, Response> {
    let Some(token) = extract_access_token(headers) else {
        return Err(message(StatusCode::UNAUTHORIZED, "Access Token not found"));
    };

    let claims = auth_state.keys().verify_access(&token).map_err(|err| {
        debug!("Rejected access token: {err}");
        message(StatusCode::UNAUTHORIZED, "Invalid or expired token")
    })?;

    match users::find_by_id(pool, claims.user_id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(message(StatusCode::NOT_FOUND, "User not found")),
        Err(err) => {
            error!("Failed to load user: {err}");
            Err(message(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ))
        }
    }
}
