//! Food database lookups (Spoonacular-compatible API).

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;
use utoipa::ToSchema;

use crate::APP_USER_AGENT;

/// Results returned per search.
pub const SEARCH_LIMIT: u32 = 10;

#[derive(Debug, Error)]
pub enum FoodApiError {
    #[error("food not found")]
    NotFound,
    #[error("food database answered {0}")]
    Upstream(StatusCode),
    #[error("food database request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FoodSearchResult {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NutrientItem {
    pub title: String,
    pub amount: String,
    #[serde(default)]
    pub percent_of_daily_needs: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FoodNutrients {
    pub calories: String,
    pub protein: String,
    pub carbs: String,
    pub fat: String,
    pub fiber: String,
    pub good: Vec<NutrientItem>,
    pub bad: Vec<NutrientItem>,
}

#[async_trait]
pub trait FoodDatabase: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<FoodSearchResult>, FoodApiError>;

    async fn nutrients(&self, id: i64) -> Result<FoodNutrients, FoodApiError>;
}

/// Amount of the "fiber" entry among the beneficial nutrients, empty when absent.
#[must_use]
pub fn fiber_amount(good: &[NutrientItem]) -> String {
    good.iter()
        .find(|item| item.title.eq_ignore_ascii_case("fiber"))
        .map(|item| item.amount.clone())
        .unwrap_or_default()
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<FoodSearchResult>,
}

#[derive(Deserialize)]
struct NutritionWidget {
    calories: String,
    protein: String,
    carbs: String,
    fat: String,
    #[serde(default)]
    good: Vec<NutrientItem>,
    #[serde(default)]
    bad: Vec<NutrientItem>,
}

pub struct SpoonacularClient {
    client: Client,
    api_url: String,
    api_key: SecretString,
}

impl std::fmt::Debug for SpoonacularClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpoonacularClient")
            .field("api_url", &self.api_url)
            .field("api_key", &"***")
            .finish()
    }
}

impl SpoonacularClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_url: String, api_key: SecretString) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build food database HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, FoodApiError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(FoodApiError::NotFound),
        status => Err(FoodApiError::Upstream(status)),
    }
}

#[async_trait]
impl FoodDatabase for SpoonacularClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<FoodSearchResult>, FoodApiError> {
        let limit = SEARCH_LIMIT.to_string();
        let response = self
            .client
            .get(format!("{}/recipes/complexSearch", self.api_url))
            .query(&[
                ("query", query),
                ("number", limit.as_str()),
                ("apiKey", self.api_key.expose_secret()),
            ])
            .send()
            .await?;

        let body: SearchResponse = check_status(response)?.json().await?;
        Ok(body.results)
    }

    #[instrument(skip(self))]
    async fn nutrients(&self, id: i64) -> Result<FoodNutrients, FoodApiError> {
        let response = self
            .client
            .get(format!("{}/recipes/{id}/nutritionWidget.json", self.api_url))
            .query(&[("apiKey", self.api_key.expose_secret())])
            .send()
            .await?;

        let widget: NutritionWidget = check_status(response)?.json().await?;
        Ok(FoodNutrients {
            fiber: fiber_amount(&widget.good),
            calories: widget.calories,
            protein: widget.protein,
            carbs: widget.carbs,
            fat: widget.fat,
            good: widget.good,
            bad: widget.bad,
        })
    }
}
