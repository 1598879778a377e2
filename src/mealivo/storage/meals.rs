//! Meal rows and the in-memory filters used by the meals listing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::{cmp::Ordering, fmt, str::FromStr};
use thiserror::Error;
use tracing::{info_span, Instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::mealivo::nutrition::parse_nutrient;

const MEAL_COLUMNS: &str = "id, user_id, meal_name, meal_type, description, calories, protein, \
     carbohydrates, fat, fiber, tags, created_at";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("mealType must be one of breakfast, lunch, dinner or snack")]
pub struct InvalidMealType;

impl MealType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = InvalidMealType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            "snack" => Ok(Self::Snack),
            _ => Err(InvalidMealType),
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MealRecord {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub meal_name: String,
    pub meal_type: MealType,
    pub description: Option<String>,
    pub calories: String,
    pub protein: String,
    pub carbohydrates: String,
    pub fat: String,
    pub fiber: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl MealRecord {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let meal_type: String = row.try_get("meal_type")?;
        let meal_type = meal_type
            .parse::<MealType>()
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            meal_name: row.try_get("meal_name")?,
            meal_type,
            description: row.try_get("description")?,
            calories: row.try_get("calories")?,
            protein: row.try_get("protein")?,
            carbohydrates: row.try_get("carbohydrates")?,
            fat: row.try_get("fat")?,
            fiber: row.try_get("fiber")?,
            tags: row.try_get("tags")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// A validated meal ready to insert.
#[derive(Clone, Debug)]
pub struct NewMeal {
    pub meal_name: String,
    pub meal_type: MealType,
    pub description: Option<String>,
    pub calories: String,
    pub protein: String,
    pub carbohydrates: String,
    pub fat: String,
    pub fiber: String,
    pub tags: Vec<String>,
}

pub async fn insert_meal(
    pool: &PgPool,
    user_id: Uuid,
    meal: &NewMeal,
) -> Result<MealRecord, sqlx::Error> {
    let query = format!(
        "INSERT INTO meals (id, user_id, meal_name, meal_type, description, calories, protein, \
         carbohydrates, fat, fiber, tags) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING {MEAL_COLUMNS}"
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&meal.meal_name)
        .bind(meal.meal_type.as_str())
        .bind(meal.description.as_deref())
        .bind(&meal.calories)
        .bind(&meal.protein)
        .bind(&meal.carbohydrates)
        .bind(&meal.fat)
        .bind(&meal.fiber)
        .bind(&meal.tags)
        .fetch_one(pool)
        .instrument(span)
        .await?;
    MealRecord::from_row(&row)
}

/// Delete one meal owned by `user_id`. Returns `false` when nothing matched.
pub async fn delete_meal(pool: &PgPool, user_id: Uuid, meal_id: Uuid) -> Result<bool, sqlx::Error> {
    let query = "DELETE FROM meals WHERE id = $1 AND user_id = $2";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(meal_id)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// All meals of a user, oldest first.
pub async fn list_meals(pool: &PgPool, user_id: Uuid) -> Result<Vec<MealRecord>, sqlx::Error> {
    let query =
        format!("SELECT {MEAL_COLUMNS} FROM meals WHERE user_id = $1 ORDER BY created_at ASC, id");
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let rows = sqlx::query(&query)
        .bind(user_id)
        .fetch_all(pool)
        .instrument(span)
        .await?;
    rows.iter().map(MealRecord::from_row).collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MealSort {
    #[default]
    Newest,
    Oldest,
    CaloriesHigh,
    CaloriesLow,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("sort must be one of newest, oldest, calories-high or calories-low")]
pub struct InvalidMealSort;

impl FromStr for MealSort {
    type Err = InvalidMealSort;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "" | "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "calories-high" => Ok(Self::CaloriesHigh),
            "calories-low" => Ok(Self::CaloriesLow),
            _ => Err(InvalidMealSort),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MealQuery {
    pub meal_type: Option<MealType>,
    pub sort: MealSort,
    pub search: Option<String>,
}

fn calories_of(meal: &MealRecord) -> f64 {
    parse_nutrient(&meal.calories).unwrap_or(0.0)
}

fn matches_search(meal: &MealRecord, needle: &str) -> bool {
    meal.meal_name.to_lowercase().contains(needle)
        || meal
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
}

/// Apply the listing filters to meals loaded with [`list_meals`].
#[must_use]
pub fn filter_and_sort(meals: Vec<MealRecord>, query: &MealQuery) -> Vec<MealRecord> {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut meals: Vec<MealRecord> = meals
        .into_iter()
        .filter(|meal| query.meal_type.is_none_or(|t| meal.meal_type == t))
        .filter(|meal| needle.as_deref().is_none_or(|n| matches_search(meal, n)))
        .collect();

    match query.sort {
        MealSort::Newest => meals.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        MealSort::Oldest => meals.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        MealSort::CaloriesHigh => meals.sort_by(|a, b| {
            calories_of(b)
                .partial_cmp(&calories_of(a))
                .unwrap_or(Ordering::Equal)
        }),
        MealSort::CaloriesLow => meals.sort_by(|a, b| {
            calories_of(a)
                .partial_cmp(&calories_of(b))
                .unwrap_or(Ordering::Equal)
        }),
    }

    meals
}
