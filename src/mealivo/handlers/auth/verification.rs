//! Email verification endpoints.

use anyhow::{Context, Result};
use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::{
    state::AuthState,
    types::{ResendVerificationRequest, VerifyEmailQuery},
};
use crate::mealivo::{
    email::{verification_email, EmailSender},
    handlers::{message, normalize_email, valid_email, Message},
    storage::users,
};

const RESEND_MESSAGE: &str =
    "If the account exists and is not verified, a new verification email has been sent";

/// Issue a fresh verification token and email the link to `email`.
pub(super) async fn send_verification(
    auth_state: &AuthState,
    email_sender: &dyn EmailSender,
    email: &str,
    first_name: &str,
) -> Result<()> {
    let ttl_seconds = auth_state.config().verification_token_ttl_seconds();
    let token = auth_state
        .keys()
        .issue_verification(email, ttl_seconds)
        .context("failed to issue verification token")?;
    let link = auth_state.config().verify_url(&token);
    let message = verification_email(email, first_name, &link, ttl_seconds)?;
    email_sender.send(&message).await
}

/// Confirm account ownership from the emailed link.
#[utoipa::path(
    get,
    path = "/api/verify-email",
    params(VerifyEmailQuery),
    responses(
        (status = 200, description = "Email verified", body = Message),
        (status = 400, description = "Missing, invalid or expired token", body = Message),
        (status = 404, description = "No account for the token's email", body = Message)
    ),
    tag = "auth"
)]
pub async fn verify_email(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<VerifyEmailQuery>,
) -> impl IntoResponse {
    let token = query.token.as_deref().map(str::trim).unwrap_or_default();
    if token.is_empty() {
        return message(StatusCode::BAD_REQUEST, "Missing token");
    }

    let claims = match auth_state.keys().verify_verification(token) {
        Ok(claims) => claims,
        Err(err) => {
            debug!("Rejected verification token: {err}");
            return message(StatusCode::BAD_REQUEST, "Invalid or expired token");
        }
    };

    match users::mark_email_verified(&pool, &claims.email).await {
        Ok(true) => {
            info!(email = %claims.email, "email verified");
            message(StatusCode::OK, "Email verified")
        }
        Ok(false) => message(StatusCode::NOT_FOUND, "User not found"),
        Err(err) => {
            error!("Failed to verify email: {err}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Verification failed")
        }
    }
}

/// Resend a verification email (always returns 200 to avoid user enumeration).
#[utoipa::path(
    post,
    path = "/api/resend-verification",
    request_body = ResendVerificationRequest,
    responses(
        (status = 200, description = "Resend accepted", body = Message)
    ),
    tag = "auth"
)]
pub async fn resend_verification(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    email_sender: Extension<Arc<dyn EmailSender>>,
    payload: Option<Json<ResendVerificationRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return message(StatusCode::OK, RESEND_MESSAGE);
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return message(StatusCode::OK, RESEND_MESSAGE);
    }

    match users::find_by_email(&pool, &email).await {
        Ok(Some(user)) if !user.is_verified() => {
            if let Err(err) = send_verification(
                &auth_state,
                email_sender.0.as_ref(),
                &user.email,
                &user.first_name,
            )
            .await
            {
                error!("Failed to resend verification email: {err:#}");
            }
        }
        Ok(_) => debug!("Resend skipped, no unverified account"),
        Err(err) => error!("Failed to look up user for resend: {err}"),
    }

    message(StatusCode::OK, RESEND_MESSAGE)
}
