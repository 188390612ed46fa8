// 👩‍🍳 Cook Entity
//
// Cooks do not own dishes. Participation lives in the dish_cooks table.

use serde::{Deserialize, Serialize};

use super::validate_name;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cook {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// Registration payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCook {
    pub first_name: String,
    pub last_name: String,
}

impl NewCook {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        NewCook {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_name("first_name", &self.first_name)?;
        validate_name("last_name", &self.last_name)
    }
}
