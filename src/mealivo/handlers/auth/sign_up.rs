//! Account creation.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use super::{
    password::{hash_password, password_meets_policy, valid_name},
    state::AuthState,
    types::SignUpRequest,
    verification::send_verification,
};
use crate::mealivo::{
    email::EmailSender,
    handlers::{message, normalize_email, valid_email, Message},
    storage::{
        is_unique_violation,
        users::{self, NewUser},
    },
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please provide all inputs properly")]
    MissingInput,
    #[error("First name must be between 2 and 15 characters")]
    FirstName,
    #[error("Last name must be between 2 and 15 characters")]
    LastName,
    #[error("Please enter a valid email")]
    Email,
    #[error(
        "Password must be at least 8 characters and include an uppercase letter, a lowercase letter, a number and a special character"
    )]
    Password,
}

#[derive(Debug, PartialEq, Eq)]
pub(super) struct ValidSignUp {
    pub(super) first_name: String,
    pub(super) last_name: String,
    pub(super) email: String,
    pub(super) password: String,
}

pub(super) fn validate(request: SignUpRequest) -> Result<ValidSignUp, ValidationError> {
    let first_name = request.first_name.trim().to_string();
    let last_name = request.last_name.trim().to_string();
    let email = normalize_email(&request.email);

    if first_name.is_empty() || last_name.is_empty() || email.is_empty() || request.password.is_empty()
    {
        return Err(ValidationError::MissingInput);
    }
    if !valid_name(&first_name) {
        return Err(ValidationError::FirstName);
    }
    if !valid_name(&last_name) {
        return Err(ValidationError::LastName);
    }
    if !valid_email(&email) {
        return Err(ValidationError::Email);
    }
    if !password_meets_policy(&request.password) {
        return Err(ValidationError::Password);
    }

    Ok(ValidSignUp {
        first_name,
        last_name,
        email,
        password: request.password,
    })
}

#[utoipa::path(
    post,
    path = "/api/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 200, description = "Account created and verification email sent", body = Message),
        (status = 400, description = "Missing or invalid input", body = Message),
        (status = 409, description = "Email already registered", body = Message),
        (status = 500, description = "Account could not be created or email not sent", body = Message)
    ),
    tag = "auth"
)]
pub async fn sign_up(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    email_sender: Extension<Arc<dyn EmailSender>>,
    payload: Option<Json<SignUpRequest>>,
) -> impl IntoResponse {
    let request: SignUpRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return message(
                StatusCode::BAD_REQUEST,
                ValidationError::MissingInput.to_string(),
            )
        }
    };

    let sign_up = match validate(request) {
        Ok(sign_up) => sign_up,
        Err(err) => return message(StatusCode::BAD_REQUEST, err.to_string()),
    };

    match users::user_exists(&pool, &sign_up.email).await {
        Ok(true) => {
            return message(StatusCode::CONFLICT, "User already exists please sign-in");
        }
        Ok(false) => {}
        Err(err) => {
            error!("Failed to check existing user: {err}");
            return message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    }

    let password_hash = match hash_password(sign_up.password).await {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    let new_user = NewUser {
        email: &sign_up.email,
        password_hash: &password_hash,
        first_name: &sign_up.first_name,
        last_name: &sign_up.last_name,
    };
    match users::insert_user(&pool, &new_user).await {
        Ok(user_id) => info!(%user_id, "user registered"),
        Err(err) if is_unique_violation(&err) => {
            // Lost a race with a concurrent sign-up for the same address.
            return message(StatusCode::CONFLICT, "User already exists please sign-in");
        }
        Err(err) => {
            error!("Failed to insert user: {err}");
            return message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    }

    if let Err(err) = send_verification(
        &auth_state,
        email_sender.0.as_ref(),
        &sign_up.email,
        &sign_up.first_name,
    )
    .await
    {
        error!("Failed to send verification email: {err:#}");
        return message(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to send verification email",
        );
    }

    message(StatusCode::OK, "Verification Email sent")
}
