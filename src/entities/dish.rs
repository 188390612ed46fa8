// 🍽️ Dish Entity - label, price, calories, category
//
// Price and calories travel as f64 but are stored and summed as integer
// hundredths, so totals are exact and the 2000 calorie threshold compares
// exactly. Inputs finer than a hundredth are rejected, never rounded.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CateringError, Result};

// ============================================================================
// FIXED-POINT HELPERS
// ============================================================================

/// Largest accepted price or calorie count. Its hundredths stay inside the
/// range where f64 holds every integer exactly.
pub const MAX_AMOUNT: f64 = 1e12;

/// Nearest hundredth of a value already checked by `NewDish::validate`
pub fn to_hundredths(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

pub fn from_hundredths(value: i64) -> f64 {
    value as f64 / 100.0
}

// ============================================================================
// CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    #[serde(alias = "ENTREE")]
    Starter,

    /// Main course - the category the cook report looks for
    #[serde(alias = "PRINCIPAL")]
    Main,

    Dessert,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Starter => "STARTER",
            Category::Main => "MAIN",
            Category::Dessert => "DESSERT",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CateringError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "STARTER" | "ENTREE" => Ok(Category::Starter),
            "MAIN" | "PRINCIPAL" => Ok(Category::Main),
            "DESSERT" => Ok(Category::Dessert),
            other => Err(CateringError::Validation(format!("unknown category: {other}"))),
        }
    }
}

// ============================================================================
// DISH ENTITY
// ============================================================================

/// A stored dish, with its owning client and participating cooks by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: i64,
    pub label: String,
    pub price: f64,
    pub calories: f64,
    pub category: Category,
    pub client_id: i64,
    pub cook_ids: Vec<i64>,
}

/// A dish that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDish {
    pub label: String,
    pub price: f64,
    pub calories: f64,
    pub category: Category,
}

impl NewDish {
    pub fn new(label: impl Into<String>, price: f64, calories: f64, category: Category) -> Self {
        NewDish {
            label: label.into(),
            price,
            calories,
            category,
        }
    }

    /// Negative amounts would silently shrink bills and calorie sums
    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(CateringError::Validation("label must not be empty".to_string()));
        }
        check_amount("price", self.price)?;
        check_amount("calories", self.calories)
    }

    pub fn price_hundredths(&self) -> i64 {
        to_hundredths(self.price)
    }

    pub fn calories_hundredths(&self) -> i64 {
        to_hundredths(self.calories)
    }
}

fn check_amount(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(CateringError::Validation(format!("{field} must be a finite number")));
    }
    if value < 0.0 {
        return Err(CateringError::Validation(format!(
            "{field} must not be negative, got {value}"
        )));
    }
    if value > MAX_AMOUNT {
        return Err(CateringError::Validation(format!(
            "{field} must not exceed {MAX_AMOUNT}, got {value}"
        )));
    }

    let scaled = value * 100.0;
    let tolerance = (scaled.abs() * f64::EPSILON * 4.0).max(1e-6);
    if (scaled - scaled.round()).abs() > tolerance {
        return Err(CateringError::Validation(format!(
            "{field} allows at most two decimals, got {value}"
        )));
    }
    Ok(())
}
