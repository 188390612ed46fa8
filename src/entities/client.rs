// 🧑 Client Entity - the customer who owns dishes
//
// The classification tier is derived from the calories of the client's
// dishes. It stays None until the first explicit recomputation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::validate_name;
use crate::error::{CateringError, Result};

// ============================================================================
// CLASSIFICATION TIER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Classification {
    /// Calorie sum below the threshold
    #[serde(alias = "FAIBLE")]
    Low,

    /// Calorie sum exactly at the threshold
    Ideal,

    /// Calorie sum above the threshold
    #[serde(alias = "FORT")]
    High,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Low => "LOW",
            Classification::Ideal => "IDEAL",
            Classification::High => "HIGH",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = CateringError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "LOW" | "FAIBLE" => Ok(Classification::Low),
            "IDEAL" => Ok(Classification::Ideal),
            "HIGH" | "FORT" => Ok(Classification::High),
            other => Err(CateringError::Validation(format!(
                "unknown classification: {other}"
            ))),
        }
    }
}

// ============================================================================
// CLIENT ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Registration payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClient {
    pub first_name: String,
    pub last_name: String,
}

impl NewClient {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        NewClient {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_name("first_name", &self.first_name)?;
        validate_name("last_name", &self.last_name)
    }
}
