//! Session start and end.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info};

use super::{
    password::verify_password,
    session::{access_cookie, clear_access_cookie},
    state::AuthState,
    types::{SignInRequest, SignInResponse, UserProfile},
};
use crate::mealivo::{
    handlers::{message, normalize_email, Message},
    storage::users,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[utoipa::path(
    post,
    path = "/api/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in, access token cookie set", body = SignInResponse),
        (status = 400, description = "Missing email or password", body = Message),
        (status = 401, description = "Unknown email or wrong password", body = Message),
        (status = 403, description = "Email not verified yet", body = Message)
    ),
    tag = "auth"
)]
pub async fn sign_in(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<SignInRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return message(StatusCode::BAD_REQUEST, "Please provide all inputs properly");
    };

    let email = normalize_email(&request.email);
    if email.is_empty() || request.password.is_empty() {
        return message(StatusCode::BAD_REQUEST, "Please provide all inputs properly");
    }

    let user = match users::find_by_email(&pool, &email).await {
        Ok(Some(user)) => user,
        Ok(None) => return message(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS),
        Err(err) => {
            error!("Failed to look up user: {err}");
            return message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    match verify_password(request.password, user.password_hash.clone()).await {
        Ok(true) => {}
        Ok(false) => return message(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS),
        Err(err) => {
            error!("Failed to verify password: {err}");
            return message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    }

    if !user.is_verified() {
        return message(StatusCode::FORBIDDEN, "Please verify your email");
    }

    let config = auth_state.config();
    let cookie = auth_state
        .keys()
        .issue_access(user.id, config.access_token_ttl_seconds())
        .map_err(|err| err.to_string())
        .and_then(|token| access_cookie(config, &token).map_err(|err| err.to_string()));
    let cookie = match cookie {
        Ok(cookie) => cookie,
        Err(err) => {
            error!("Failed to issue access token: {err}");
            return message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    info!(user_id = %user.id, "user signed in");

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    (
        StatusCode::OK,
        headers,
        Json(SignInResponse {
            message: "Signed in".to_string(),
            user: UserProfile::from(&user),
        }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/api/sign-out",
    responses(
        (status = 200, description = "Access token cookie cleared", body = Message)
    ),
    tag = "auth"
)]
pub async fn sign_out(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    if let Ok(cookie) = clear_access_cookie(auth_state.config()) {
        headers.insert(SET_COOKIE, cookie);
    }
    (
        StatusCode::OK,
        headers,
        Json(Message {
            message: "Signed out".to_string(),
        }),
    )
}
