//! Stripe Checkout Integration
//!
//! Implements the "Stripe Checkout (Hosted)" approach: one fixed price,
//! one-time payment mode, buyer redirected to Stripe and back.

use async_trait::async_trait;
use std::fmt::Display;
use stripe::{
    CheckoutSession as StripeCheckoutSession, CheckoutSessionId, CheckoutSessionItem,
    CheckoutSessionItemId, CheckoutSessionMode, Client, CreateCheckoutSession,
    CreateCheckoutSessionLineItems, ErrorType, List, RetrieveCheckoutSessionLineItems,
    StripeError,
};

use crate::error::{PaymentError, Result};
use crate::gateway::{CheckoutGateway, CheckoutRequest, CheckoutSession, LineItem};

/// Largest page Stripe serves for line items
const LINE_ITEM_PAGE_SIZE: u64 = 100;

/// Stripe credentials and product settings
#[derive(Clone, Debug)]
pub struct StripeConfig {
    pub secret_key: String,
    pub publishable_key: String,
    /// Price of the one product (`price_...`)
    pub price_id: String,
    pub webhook_secret: String,
}

/// Stripe-backed checkout gateway
pub struct StripeGateway {
    client: Client,
    price_id: String,
}

impl StripeGateway {
    /// Create a new gateway for one price
    pub fn new(secret_key: &str, price_id: &str) -> Self {
        Self {
            client: Client::new(secret_key),
            price_id: price_id.to_string(),
        }
    }
    
    pub fn from_config(config: &StripeConfig) -> Self {
        Self::new(&config.secret_key, &config.price_id)
    }
}

fn parse_session_id(session_id: &str) -> Result<CheckoutSessionId> {
    session_id
        .parse()
        .map_err(|_| PaymentError::InvalidRequest(format!("malformed checkout session id: {session_id}")))
}

fn map_stripe_error(err: StripeError) -> PaymentError {
    match err {
        StripeError::Stripe(request) if matches!(request.error_type, ErrorType::InvalidRequest) => {
            PaymentError::InvalidRequest(request.to_string())
        }
        other => PaymentError::Stripe(other.to_string()),
    }
}

/// Session parameters: payment mode, one line for `price_id` at the requested quantity
fn session_params<'a>(price_id: &str, request: &'a CheckoutRequest) -> CreateCheckoutSession<'a> {
    let mut params = CreateCheckoutSession::new();
    params.success_url = Some(&request.success_url);
    params.cancel_url = Some(&request.cancel_url);
    params.mode = Some(CheckoutSessionMode::Payment);
    params.line_items = Some(vec![CreateCheckoutSessionLineItems {
        price: Some(price_id.to_string()),
        quantity: Some(u64::from(request.quantity)),
        ..Default::default()
    }]);
    params
}

/// One page of a line item listing: `(item id, quantity)` pairs
struct LineItemPage<C> {
    entries: Vec<(C, Option<u64>)>,
    has_more: bool,
}

impl From<List<CheckoutSessionItem>> for LineItemPage<CheckoutSessionItemId> {
    fn from(list: List<CheckoutSessionItem>) -> Self {
        Self {
            entries: list.data.into_iter().map(|item| (item.id, item.quantity)).collect(),
            has_more: list.has_more,
        }
    }
}

/// Fetch pages until the provider reports no more, resuming after the last id seen
async fn collect_line_items<C, F, Fut>(mut fetch: F) -> Result<Vec<LineItem>>
where
    C: Clone + Display,
    F: FnMut(Option<C>) -> Fut,
    Fut: Future<Output = Result<LineItemPage<C>>>,
{
    let mut items = Vec::new();
    let mut cursor = None;
    
    loop {
        let page = fetch(cursor.take()).await?;
        
        for (id, quantity) in &page.entries {
            let quantity = quantity
                .and_then(|q| u32::try_from(q).ok())
                .filter(|q| *q > 0)
                .ok_or_else(|| PaymentError::Stripe(format!("line item {id} has no usable quantity")))?;
            items.push(LineItem { quantity });
        }
        
        match page.entries.last() {
            Some((last, _)) if page.has_more => cursor = Some(last.clone()),
            _ => break,
        }
    }
    
    Ok(items)
}

fn convert_session(session: &StripeCheckoutSession) -> Result<CheckoutSession> {
    serde_json::to_value(session)
        .and_then(CheckoutSession::from_value)
        .map_err(|e| PaymentError::Stripe(format!("unreadable checkout session: {e}")))
}

#[async_trait]
impl CheckoutGateway for StripeGateway {
    fn name(&self) -> &str {
        "stripe"
    }
    
    async fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        let params = session_params(&self.price_id, request);
        let session = StripeCheckoutSession::create(&self.client, params)
            .await
            .map_err(map_stripe_error)?;
        
        let converted = convert_session(&session)?;
        if converted.url.is_none() {
            return Err(PaymentError::Stripe("No checkout URL returned".into()));
        }
        
        tracing::info!(
            session_id = %converted.id,
            quantity = request.quantity,
            "Created checkout session"
        );
        Ok(converted)
    }
    
    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession> {
        let id = parse_session_id(session_id)?;
        let session = StripeCheckoutSession::retrieve(&self.client, &id, &[])
            .await
            .map_err(map_stripe_error)?;
        convert_session(&session)
    }
    
    async fn list_line_items(&self, session_id: &str) -> Result<Vec<LineItem>> {
        let id = parse_session_id(session_id)?;
        let client = &self.client;
        let id = &id;
        
        let items = collect_line_items(move |cursor: Option<CheckoutSessionItemId>| async move {
            let params = RetrieveCheckoutSessionLineItems {
                limit: Some(LINE_ITEM_PAGE_SIZE),
                starting_after: cursor,
                ..Default::default()
            };
            StripeCheckoutSession::retrieve_line_items(client, id, &params)
                .await
                .map(LineItemPage::from)
                .map_err(map_stripe_error)
        })
        .await?;
        
        tracing::debug!(session_id = %session_id, count = items.len(), "Listed line items");
        Ok(items)
    }
}
