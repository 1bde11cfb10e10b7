//! Error Types

use thiserror::Error;

/// Result type alias for shop operations
pub type Result<T> = std::result::Result<T, ShopError>;

/// Shop error types
#[derive(Error, Debug)]
pub enum ShopError {
    /// Form or domain validation failed
    #[error("Validation error: {0}")]
    Validation(String),
    
    /// Order or account storage failed
    #[error("Storage error: {0}")]
    Storage(String),
    
    /// Outbound email could not be delivered
    #[error("Mail error: {0}")]
    Mail(String),
    
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
    
    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ShopError {
    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            ShopError::Validation(msg) => format!("Invalid input: {}", msg),
            ShopError::Storage(_) => "We could not save your order. Please try again.".into(),
            ShopError::Mail(_) => "We could not send a confirmation email.".into(),
            ShopError::Config(_) => "Service configuration error.".into(),
            ShopError::Json(_) => "An unexpected error occurred.".into(),
        }
    }
}
