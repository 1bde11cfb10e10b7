//! Checkout Gateway
//!
//! Provider-neutral view of hosted checkout sessions. Provider objects are
//! converted into these types at the boundary; nothing downstream reads raw
//! provider JSON.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Placeholder the provider substitutes with the real session id in the success URL
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Request to create a checkout session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Units of the single product
    pub quantity: u32,
    
    /// URL to redirect after successful payment
    pub success_url: String,
    
    /// URL to redirect if checkout is cancelled
    pub cancel_url: String,
}

impl CheckoutRequest {
    /// Build a request whose success URL carries the session id placeholder
    pub fn new(quantity: u32, success_base: &str, cancel_url: impl Into<String>) -> Self {
        Self {
            quantity,
            success_url: format!("{success_base}?session_id={SESSION_ID_PLACEHOLDER}"),
            cancel_url: cancel_url.into(),
        }
    }
}

/// A hosted checkout session
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider session id
    pub id: String,
    
    /// Where to send the buyer (present on freshly created sessions)
    pub url: Option<String>,
    
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    
    /// Shipping address rendered as multi-line text
    pub shipping_details: Option<String>,
}

/// One quantified entry in a checkout session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub quantity: u32,
}

/// Hosted checkout provider
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;
    
    /// Create a one-time payment session for the configured product
    async fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession>;
    
    /// Fetch a session; unknown or malformed ids yield `PaymentError::InvalidRequest`
    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession>;
    
    /// Every line item of a session, across all result pages
    async fn list_line_items(&self, session_id: &str) -> Result<Vec<LineItem>>;
}

// ============================================================================
// Wire shapes of a Stripe checkout session object
// ============================================================================

#[derive(Debug, Deserialize)]
struct SessionObject {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    customer_details: Option<CustomerDetails>,
    #[serde(default)]
    shipping_details: Option<ShippingDetails>,
    #[serde(default)]
    collected_information: Option<CollectedInformation>,
}

#[derive(Debug, Deserialize)]
struct CustomerDetails {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CollectedInformation {
    #[serde(default)]
    shipping_details: Option<ShippingDetails>,
}

#[derive(Debug, Deserialize)]
struct ShippingDetails {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct Address {
    #[serde(default)]
    line1: Option<String>,
    #[serde(default)]
    line2: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    postal_code: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

impl ShippingDetails {
    /// One non-empty component per line
    fn render(&self) -> Option<String> {
        let mut lines: Vec<&str> = Vec::new();
        lines.extend(self.name.as_deref());
        if let Some(address) = &self.address {
            for part in [
                &address.line1,
                &address.line2,
                &address.city,
                &address.state,
                &address.postal_code,
                &address.country,
            ] {
                lines.extend(part.as_deref());
            }
        }
        
        let lines: Vec<&str> = lines
            .into_iter()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        (!lines.is_empty()).then(|| lines.join("\n"))
    }
}

impl CheckoutSession {
    /// Read a provider checkout session object
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        let object: SessionObject = serde_json::from_value(value)?;
        
        let shipping = object
            .shipping_details
            .as_ref()
            .or_else(|| {
                object
                    .collected_information
                    .as_ref()
                    .and_then(|c| c.shipping_details.as_ref())
            })
            .and_then(ShippingDetails::render);
        
        let (customer_name, customer_email) = object
            .customer_details
            .map(|c| (c.name, c.email))
            .unwrap_or_default();
        
        Ok(Self {
            id: object.id,
            url: object.url,
            customer_name,
            customer_email,
            shipping_details: shipping,
        })
    }
}
