//! Nutrient parsing and the aggregates shown on the dashboard.
//!
//! Nutrient values are stored exactly as users typed them (`"250"`, `"12.5g"`,
//! `"about 30"`). They are only interpreted here, with the same leniency as a
//! browser's `parseFloat`: the longest numeric prefix wins and anything after it
//! is ignored.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;
use utoipa::ToSchema;

use crate::mealivo::storage::meals::MealRecord;

/// Number of meals listed under "recent meals".
pub const RECENT_MEALS: usize = 3;

/// Days covered by the trend series, today included.
pub const TREND_DAYS: usize = 7;

/// Parse the leading number of a nutrient field the way `parseFloat` reads it:
/// leading whitespace skipped, trailing units ignored (`"12.5g"` is 12.5).
///
/// Returns `None` when the text has no numeric prefix. Unlike `parseFloat`,
/// `"Infinity"` and prefixes that overflow (`"1e400"`) also give `None`, so
/// every total stays a finite number that serializes to JSON.
#[must_use]
pub fn parse_nutrient(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Round to two decimals, the precision the dashboard displays.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn sum_of<F>(meals: &[MealRecord], field: F) -> f64
where
    F: Fn(&MealRecord) -> &str,
{
    meals
        .iter()
        .filter_map(|meal| parse_nutrient(field(meal)))
        .sum()
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_meals: usize,
    pub total_calories: f64,
    pub avg_calories: f64,
    pub total_protein: f64,
    pub total_fiber: f64,
    pub total_carbohydrates: f64,
    pub total_fat: f64,
}

/// Aggregate a user's meals. Unparsable values count toward `total_meals` only.
#[must_use]
pub fn summarize(meals: &[MealRecord]) -> DashboardSummary {
    let total_calories = sum_of(meals, |m| &m.calories);
    let avg_calories = if meals.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let count = meals.len() as f64;
        round2(total_calories / count)
    };

    DashboardSummary {
        total_meals: meals.len(),
        total_calories,
        avg_calories,
        total_protein: sum_of(meals, |m| &m.protein),
        total_fiber: sum_of(meals, |m| &m.fiber),
        total_carbohydrates: sum_of(meals, |m| &m.carbohydrates),
        total_fat: sum_of(meals, |m| &m.fat),
    }
}

/// The `count` most recent meals, newest first.
#[must_use]
pub fn recent_meals(meals: &[MealRecord], count: usize) -> Vec<MealRecord> {
    let mut recent = meals.to_vec();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(count);
    recent
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct DailyPoint {
    pub day: String,
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

fn day_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Per-day totals for the `days` UTC days ending on `today`, oldest first.
#[must_use]
pub fn daily_trend(meals: &[MealRecord], today: NaiveDate, days: usize) -> Vec<DailyPoint> {
    let days = i64::try_from(days).unwrap_or(i64::MAX);
    (0..days)
        .rev()
        .filter_map(|offset| today.checked_sub_signed(Duration::days(offset)))
        .map(|date| {
            let logged: Vec<MealRecord> = meals
                .iter()
                .filter(|meal| meal.created_at.date_naive() == date)
                .cloned()
                .collect();
            DailyPoint {
                day: day_label(date.weekday()).to_string(),
                date,
                calories: sum_of(&logged, |m| &m.calories),
                protein: sum_of(&logged, |m| &m.protein),
                carbs: sum_of(&logged, |m| &m.carbohydrates),
                fat: sum_of(&logged, |m| &m.fat),
            }
        })
        .collect()
}
