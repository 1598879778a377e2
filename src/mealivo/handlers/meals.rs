//! Logging, listing and deleting meals.

use axum::{
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{
    auth::{session::authenticate, AuthState},
    message, Message,
};
use crate::mealivo::storage::meals::{
    self, filter_and_sort, InvalidMealSort, InvalidMealType, MealQuery, MealRecord, MealSort,
    MealType, NewMeal,
};

const MEAL_NAME_MIN_LEN: usize = 2;
const DESCRIPTION_MAX_LEN: usize = 80;

#[derive(ToSchema, Serialize, Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct LogMealRequest {
    pub meal_name: String,
    /// One of `breakfast`, `lunch`, `dinner` or `snack`.
    pub meal_type: String,
    pub description: Option<String>,
    pub calories: String,
    pub protein: String,
    pub carbohydrates: String,
    pub fat: String,
    pub fiber: String,
    pub tags: Vec<String>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct LogMealResponse {
    pub message: String,
    pub meal: MealRecord,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteMealRequest {
    pub meal_id: String,
}

#[derive(IntoParams, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MealsQuery {
    /// `breakfast`, `lunch`, `dinner`, `snack` or `all`.
    pub meal_type: Option<String>,
    /// `newest` (default), `oldest`, `calories-high` or `calories-low`.
    pub sort: Option<String>,
    /// Case-insensitive match on the meal name or its tags.
    pub q: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct MealsResponse {
    pub meals: Vec<MealRecord>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MealValidationError {
    #[error("Meal name must be at least 2 characters")]
    MealName,
    #[error(transparent)]
    MealType(#[from] InvalidMealType),
    #[error("Description must be at most 80 characters")]
    Description,
    #[error("Please provide {0}")]
    MissingNutrient(&'static str),
}

fn required(value: &str, field: &'static str) -> Result<String, MealValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(MealValidationError::MissingNutrient(field))
    } else {
        Ok(value.to_string())
    }
}

pub(crate) fn validate_meal(request: LogMealRequest) -> Result<NewMeal, MealValidationError> {
    let meal_name = request.meal_name.trim().to_string();
    if meal_name.chars().count() < MEAL_NAME_MIN_LEN {
        return Err(MealValidationError::MealName);
    }

    let meal_type = request.meal_type.parse::<MealType>()?;

    let description = request
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    if description
        .as_ref()
        .is_some_and(|d| d.chars().count() > DESCRIPTION_MAX_LEN)
    {
        return Err(MealValidationError::Description);
    }

    Ok(NewMeal {
        meal_name,
        meal_type,
        description,
        calories: required(&request.calories, "calories")?,
        protein: required(&request.protein, "protein")?,
        carbohydrates: required(&request.carbohydrates, "carbohydrates")?,
        fat: required(&request.fat, "fat")?,
        fiber: required(&request.fiber, "fiber")?,
        tags: request
            .tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .map(ToString::to_string)
            .collect(),
    })
}

fn parse_query(query: MealsQuery) -> Result<MealQuery, String> {
    let meal_type = match query.meal_type.as_deref().map(str::trim) {
        None | Some("" | "all") => None,
        Some(value) => Some(
            value
                .parse::<MealType>()
                .map_err(|err: InvalidMealType| err.to_string())?,
        ),
    };
    let sort = match query.sort.as_deref() {
        None => MealSort::default(),
        Some(value) => value
            .parse::<MealSort>()
            .map_err(|err: InvalidMealSort| err.to_string())?,
    };
    Ok(MealQuery {
        meal_type,
        sort,
        search: query.q,
    })
}

#[utoipa::path(
    post,
    path = "/api/log-meal",
    request_body = LogMealRequest,
    responses(
        (status = 200, description = "Meal stored", body = LogMealResponse),
        (status = 400, description = "Invalid meal", body = Message),
        (status = 401, description = "Missing, invalid or expired access token", body = Message)
    ),
    tag = "meals"
)]
pub async fn log_meal(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LogMealRequest>>,
) -> impl IntoResponse {
    let user = match authenticate(&headers, &pool, &auth_state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let Some(Json(request)) = payload else {
        return message(StatusCode::BAD_REQUEST, "Please provide all inputs properly");
    };

    let meal = match validate_meal(request) {
        Ok(meal) => meal,
        Err(err) => return message(StatusCode::BAD_REQUEST, err.to_string()),
    };

    match meals::insert_meal(&pool, user.id, &meal).await {
        Ok(meal) => {
            info!(meal_id = %meal.id, user_id = %user.id, "meal logged");
            (
                StatusCode::OK,
                Json(LogMealResponse {
                    message: "Meal logged".to_string(),
                    meal,
                }),
            )
                .into_response()
        }
        Err(err) => {
            error!("Failed to insert meal: {err}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/delete-meal",
    request_body = DeleteMealRequest,
    responses(
        (status = 200, description = "Meal deleted", body = Message),
        (status = 400, description = "Malformed meal id", body = Message),
        (status = 401, description = "Missing, invalid or expired access token", body = Message),
        (status = 404, description = "No such meal for this user", body = Message)
    ),
    tag = "meals"
)]
pub async fn delete_meal(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<DeleteMealRequest>>,
) -> impl IntoResponse {
    let user = match authenticate(&headers, &pool, &auth_state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let meal_id = payload.and_then(|Json(request)| Uuid::parse_str(request.meal_id.trim()).ok());
    let Some(meal_id) = meal_id else {
        return message(StatusCode::BAD_REQUEST, "Invalid meal id");
    };

    match meals::delete_meal(&pool, user.id, meal_id).await {
        Ok(true) => {
            info!(%meal_id, user_id = %user.id, "meal deleted");
            message(StatusCode::OK, "Meal deleted")
        }
        Ok(false) => message(StatusCode::NOT_FOUND, "Meal not found"),
        Err(err) => {
            error!("Failed to delete meal: {err}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/meals",
    params(MealsQuery),
    responses(
        (status = 200, description = "Filtered and sorted meals", body = MealsResponse),
        (status = 400, description = "Unknown meal type or sort order", body = Message),
        (status = 401, description = "Missing, invalid or expired access token", body = Message)
    ),
    tag = "meals"
)]
pub async fn list_meals(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<MealsQuery>,
) -> impl IntoResponse {
    let query = match parse_query(query) {
        Ok(query) => query,
        Err(err) => return message(StatusCode::BAD_REQUEST, err),
    };

    let user = match authenticate(&headers, &pool, &auth_state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match meals::list_meals(&pool, user.id).await {
        Ok(all) => (
            StatusCode::OK,
            Json(MealsResponse {
                meals: filter_and_sort(all, &query),
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to list meals: {err}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}
