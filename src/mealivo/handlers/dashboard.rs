use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use super::{
    auth::{session::authenticate, AuthState},
    message, Message,
};
use crate::mealivo::{
    nutrition::{
        daily_trend, recent_meals, summarize, DailyPoint, DashboardSummary, RECENT_MEALS,
        TREND_DAYS,
    },
    storage::meals::{self, MealRecord},
};

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub summary: DashboardSummary,
    pub recent_meals: Vec<MealRecord>,
    pub trend: Vec<DailyPoint>,
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Nutrition summary, recent meals and the weekly trend", body = DashboardResponse),
        (status = 401, description = "Missing, invalid or expired access token", body = Message)
    ),
    tag = "dashboard"
)]
pub async fn dashboard(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let user = match authenticate(&headers, &pool, &auth_state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let logged = match meals::list_meals(&pool, user.id).await {
        Ok(logged) => logged,
        Err(err) => {
            error!("Failed to list meals: {err}");
            return message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    let today = Utc::now().date_naive();
    (
        StatusCode::OK,
        Json(DashboardResponse {
            summary: summarize(&logged),
            recent_meals: recent_meals(&logged, RECENT_MEALS),
            trend: daily_trend(&logged, today, TREND_DAYS),
        }),
    )
        .into_response()
}
