// Catering errors - every missing record is an explicit NotFound
//
// Domain operations return `Result<T>`; binaries and setup code wrap these in
// anyhow with context.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CateringError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("client not found: {first_name} {last_name}")]
    ClientNameNotFound {
        first_name: String,
        last_name: String,
    },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CateringError {
    pub fn client_not_found(id: i64) -> Self {
        CateringError::NotFound { entity: "client", id }
    }

    pub fn cook_not_found(id: i64) -> Self {
        CateringError::NotFound { entity: "cook", id }
    }

    pub fn dish_not_found(id: i64) -> Self {
        CateringError::NotFound { entity: "dish", id }
    }

    /// True for both the id-based and the name-based not-found variants
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CateringError::NotFound { .. } | CateringError::ClientNameNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CateringError>;
