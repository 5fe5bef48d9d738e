//! Error handling for the Stockflow backend

use shared::FifoError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    // Business logic errors
    #[error("Insufficient inventory: requested {requested}, available {available}")]
    InsufficientInventory { requested: i64, available: i64 },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code for callers
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::InsufficientInventory { .. } => "INSUFFICIENT_INVENTORY",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Internal(_) | AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<FifoError> for AppError {
    fn from(err: FifoError) -> Self {
        match err {
            FifoError::InvalidQuantity { requested } => AppError::validation(
                "quantity",
                format!("Quantity must be positive, got {}", requested),
            ),
            FifoError::InsufficientLotStock {
                requested,
                available,
            } => AppError::InsufficientInventory {
                requested,
                available,
            },
            FifoError::ConcurrentModification { lot_id } => {
                AppError::Conflict(format!("Lot {} was modified concurrently", lot_id))
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_default();
        AppError::Validation {
            field,
            message: errors.to_string(),
        }
    }
}

/// Result type alias for services
pub type AppResult<T> = Result<T, AppError>;
