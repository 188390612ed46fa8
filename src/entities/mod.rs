// Entity Models
//
// Entities never point at each other. A Dish carries its owning client id and
// the ids of its cooks; the store is the arena and the dish_cooks table is
// the index between dishes and cooks.

pub mod client;
pub mod cook;
pub mod dish;

pub use client::{Classification, Client, NewClient};
pub use cook::{Cook, NewCook};
pub use dish::{from_hundredths, to_hundredths, Category, Dish, NewDish, MAX_AMOUNT};

use crate::error::{CateringError, Result};

/// Names are matched verbatim later on, so only reject blanks here
pub(crate) fn validate_name(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CateringError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}
