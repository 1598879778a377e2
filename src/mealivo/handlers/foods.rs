//! Food database proxy endpoints.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use super::{message, Message};
use crate::mealivo::foods::{FoodApiError, FoodDatabase, FoodNutrients, FoodSearchResult};

#[derive(IntoParams, Deserialize, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Free-text food or dish name.
    pub query: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct SearchResponse {
    pub results: Vec<FoodSearchResult>,
}

fn upstream_error(err: &FoodApiError) -> axum::response::Response {
    match err {
        FoodApiError::NotFound => message(StatusCode::NOT_FOUND, "Food not found"),
        FoodApiError::Upstream(_) | FoodApiError::Request(_) => {
            error!("Food database request failed: {err}");
            message(StatusCode::BAD_GATEWAY, "Food database unavailable")
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/search-meal",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching foods", body = SearchResponse),
        (status = 400, description = "Empty query", body = Message),
        (status = 502, description = "Food database failed", body = Message)
    ),
    tag = "foods"
)]
pub async fn search_meal(
    foods: Extension<Arc<dyn FoodDatabase>>,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let term = query.query.as_deref().map(str::trim).unwrap_or_default();
    if term.is_empty() {
        return message(StatusCode::BAD_REQUEST, "Please provide a search query");
    }

    match foods.search(term).await {
        Ok(results) => (StatusCode::OK, Json(SearchResponse { results })).into_response(),
        Err(FoodApiError::NotFound) => (
            StatusCode::OK,
            Json(SearchResponse {
                results: Vec::new(),
            }),
        )
            .into_response(),
        Err(err) => upstream_error(&err),
    }
}

#[utoipa::path(
    get,
    path = "/api/food-nutrients/{id}",
    params(
        ("id" = i64, Path, description = "Food id from a search result")
    ),
    responses(
        (status = 200, description = "Nutrient profile", body = FoodNutrients),
        (status = 404, description = "Unknown food", body = Message),
        (status = 502, description = "Food database failed", body = Message)
    ),
    tag = "foods"
)]
pub async fn food_nutrients(
    foods: Extension<Arc<dyn FoodDatabase>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match foods.nutrients(id).await {
        Ok(nutrients) => (StatusCode::OK, Json(nutrients)).into_response(),
        Err(err) => upstream_error(&err),
    }
}
