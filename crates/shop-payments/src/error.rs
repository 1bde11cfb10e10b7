//! Payment Error Types

use thiserror::Error;

use shop_core::ShopError;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Stripe API error
    #[error("Stripe error: {0}")]
    Stripe(String),
    
    /// Stripe rejected the request (unknown or malformed id, bad parameters)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    
    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),
    
    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),
    
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
    
    /// Order storage or notification failed during fulfillment
    #[error("Fulfillment error: {0}")]
    Fulfillment(#[from] ShopError),
}

impl PaymentError {
    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            PaymentError::Stripe(_) => "Payment processing failed. Please try again.",
            PaymentError::InvalidRequest(_) => {
                "There was a problem while buying your product. Please try again."
            }
            PaymentError::Config(_) => "Service configuration error.",
            _ => "An error occurred processing your request.",
        }
    }
}
