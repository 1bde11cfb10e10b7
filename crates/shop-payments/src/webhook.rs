//! Stripe Webhook Handling
//!
//! Verifies `Stripe-Signature` headers and routes completed checkouts to
//! fulfillment. Only `checkout.session.completed` is handled.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;

use crate::error::{PaymentError, Result};
use crate::fulfillment::{FulfillmentReport, OrderFulfiller};
use crate::gateway::CheckoutSession;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Event type that triggers fulfillment
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

/// Maximum age of a signed payload, in seconds
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Parsed `Stripe-Signature` header: `t=<unix>,v1=<hex>[,v1=<hex>...]`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        
        for part in header.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            match key.trim() {
                "t" => {
                    timestamp = Some(value.trim().parse::<i64>().map_err(|_| {
                        PaymentError::WebhookSignature("invalid timestamp".into())
                    })?);
                }
                "v1" => {
                    // Entries that are not hex can never match; skip them
                    if let Ok(bytes) = hex::decode(value.trim()) {
                        signatures.push(bytes);
                    }
                }
                _ => {}
            }
        }
        
        let timestamp = timestamp
            .ok_or_else(|| PaymentError::WebhookSignature("missing timestamp".into()))?;
        if signatures.is_empty() {
            return Err(PaymentError::WebhookSignature("no v1 signature".into()));
        }
        
        Ok(Self { timestamp, signatures })
    }
}

/// Verified webhook event
#[derive(Clone, Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub id: String,
    
    #[serde(rename = "type")]
    pub event_type: String,
    
    pub data: EventData,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

impl WebhookEvent {
    pub fn is_checkout_completed(&self) -> bool {
        self.event_type == CHECKOUT_SESSION_COMPLETED
    }
    
    /// The embedded object read as a checkout session
    pub fn checkout_session(&self) -> Result<CheckoutSession> {
        CheckoutSession::from_value(self.data.object.clone())
            .map_err(|e| PaymentError::WebhookParse(format!("invalid checkout session data: {e}")))
    }
}

/// Checks webhook signatures against the shared endpoint secret
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"[REDACTED]")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }
    
    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }
    
    fn mac(&self, payload: &[u8], timestamp: i64) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| PaymentError::Config(format!("unusable webhook secret: {e}")))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }
    
    /// Header value Stripe would send for `payload` signed at `timestamp`
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> Result<String> {
        let signature = hex::encode(self.mac(payload, timestamp)?.finalize().into_bytes());
        Ok(format!("t={timestamp},v1={signature}"))
    }
    
    /// Verify the signature and parse the event, using the current time
    pub fn construct_event(&self, payload: &[u8], signature: Option<&str>) -> Result<WebhookEvent> {
        self.construct_event_at(payload, signature, chrono::Utc::now().timestamp())
    }
    
    pub fn construct_event_at(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        now: i64,
    ) -> Result<WebhookEvent> {
        let header = signature
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| PaymentError::WebhookSignature("missing signature header".into()))?;
        let header = SignatureHeader::parse(header)?;
        
        let mut matched = false;
        for candidate in &header.signatures {
            if self.mac(payload, header.timestamp)?.verify_slice(candidate).is_ok() {
                matched = true;
                break;
            }
        }
        if !matched {
            return Err(PaymentError::WebhookSignature(
                "no signatures found matching the expected signature for payload".into(),
            ));
        }
        
        if (now - header.timestamp).abs() > self.tolerance_secs {
            return Err(PaymentError::WebhookSignature("timestamp outside the tolerance zone".into()));
        }
        
        serde_json::from_slice(payload).map_err(|e| PaymentError::WebhookParse(e.to_string()))
    }
}

/// Outcome of a verified webhook
#[derive(Clone, Debug)]
pub enum WebhookOutcome {
    /// Checkout completed and orders were recorded
    Fulfilled(FulfillmentReport),
    
    /// Verified, but not an event this shop acts on
    Unhandled { event_type: String },
}

/// Webhook handler
pub struct WebhookHandler {
    verifier: WebhookVerifier,
    fulfiller: Arc<dyn OrderFulfiller>,
}

impl WebhookHandler {
    pub fn new(verifier: WebhookVerifier, fulfiller: Arc<dyn OrderFulfiller>) -> Self {
        Self { verifier, fulfiller }
    }
    
    /// Verify webhook signature and parse event
    pub fn parse_event(&self, payload: &[u8], signature: Option<&str>) -> Result<WebhookEvent> {
        self.verifier.construct_event(payload, signature)
    }
    
    /// Process a verified event
    pub async fn handle(&self, event: WebhookEvent) -> Result<WebhookOutcome> {
        tracing::info!(event_id = %event.id, event_type = %event.event_type, "Processing Stripe webhook");
        
        if !event.is_checkout_completed() {
            tracing::debug!(event_type = %event.event_type, "Unhandled webhook event");
            return Ok(WebhookOutcome::Unhandled {
                event_type: event.event_type,
            });
        }
        
        let session = event.checkout_session()?;
        let report = self.fulfiller.fulfill(&session).await?;
        Ok(WebhookOutcome::Fulfilled(report))
    }
}
