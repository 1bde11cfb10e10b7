//! # shop-payments
//!
//! Stripe checkout, webhook verification and order fulfillment for the
//! one-product shop.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌─────────────┐
//! │  Shop form  │────▶│  Stripe Hosted  │────▶│    Shop     │
//! │ (/purchase) │     │  Checkout Page  │     │  (success)  │
//! └─────────────┘     └────────┬────────┘     └─────────────┘
//!                              │ checkout.session.completed
//!                              ▼
//!                      ┌───────────────┐     ┌──────────────────┐
//!                      │   /webhook    │────▶│ orders + emails  │
//!                      │ (HMAC-SHA256) │     │ (one row / item) │
//!                      └───────────────┘     └──────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shop_payments::{CheckoutGateway, CheckoutRequest, StripeConfig, StripeGateway};
//!
//! let config = StripeConfig::from_env()?;
//! let gateway = StripeGateway::from_config(&config);
//!
//! let session = gateway
//!     .create_session(&CheckoutRequest::new(
//!         2,
//!         "https://shop.example.com/purchase_success",
//!         "https://shop.example.com/",
//!     ))
//!     .await?;
//!
//! // Redirect buyer to: session.url
//! ```

mod checkout;
mod error;
mod fulfillment;
mod gateway;
mod webhook;

pub use checkout::{StripeConfig, StripeGateway};
pub use error::{PaymentError, Result};
pub use fulfillment::{FulfillmentReport, FulfillmentService, OrderFulfiller};
pub use gateway::{CheckoutGateway, CheckoutRequest, CheckoutSession, LineItem, SESSION_ID_PLACEHOLDER};
pub use webhook::{
    CHECKOUT_SESSION_COMPLETED, DEFAULT_TOLERANCE_SECS, EventData, SIGNATURE_HEADER,
    SignatureHeader, WebhookEvent, WebhookHandler, WebhookOutcome, WebhookVerifier,
};
