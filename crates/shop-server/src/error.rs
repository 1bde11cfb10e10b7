//! HTTP Error Responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use shop_core::ShopError;
use shop_payments::PaymentError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Failures that escape a handler as a 500
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Payment(#[from] PaymentError),
    
    #[error(transparent)]
    Shop(#[from] ShopError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");
        
        let (error, code) = match &self {
            AppError::Payment(e) => (e.user_message().to_string(), "PAYMENT_ERROR"),
            AppError::Shop(e) => (e.user_message(), "SHOP_ERROR"),
        };
        
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error,
                code: code.into(),
            }),
        )
            .into_response()
    }
}
