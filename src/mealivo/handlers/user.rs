use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use super::{
    auth::{session::authenticate, types::UserProfile, AuthState},
    message, Message,
};
use crate::mealivo::storage::meals::{self, MealRecord};

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    /// Every logged meal, oldest first.
    pub foods_logged: Vec<MealRecord>,
}

#[utoipa::path(
    get,
    path = "/api/user",
    responses(
        (status = 200, description = "Profile of the signed-in user with logged meals", body = UserResponse),
        (status = 401, description = "Missing, invalid or expired access token", body = Message),
        (status = 404, description = "User no longer exists", body = Message)
    ),
    tag = "user"
)]
pub async fn user(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let user = match authenticate(&headers, &pool, &auth_state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match meals::list_meals(&pool, user.id).await {
        Ok(foods_logged) => (
            StatusCode::OK,
            Json(UserResponse {
                profile: UserProfile::from(&user),
                foods_logged,
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to list meals: {err}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}
