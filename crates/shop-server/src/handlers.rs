//! HTTP Handlers

use axum::{
    Form, Json,
    body::Bytes,
    extract::{Query, State, rejection::FormRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use subtle::ConstantTimeEq;

use shop_core::{Order, PurchaseForm};
use shop_payments::{CheckoutRequest, PaymentError, SIGNATURE_HEADER, WebhookOutcome};

use crate::error::AppError;
use crate::flash::{self, FlashMessage};
use crate::pages;
use crate::state::AppState;

/// Shown when the provider rejects a returning session id
pub const PURCHASE_FAILED_MESSAGE: &str =
    "There was a problem while buying your product. Please try again.";

/// Header htmx follows as a client-side redirect
pub const HX_REDIRECT: &str = "hx-redirect";

const ADMIN_ORDER_LIMIT: usize = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub payment_gateway: String,
    pub orders_reachable: bool,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseSuccessQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

// ============================================================================
// Helpers
// ============================================================================

/// Absolute URL for `path`, from `SITE_URL` or the request's `Host`
///
/// The `Host` fallback trusts the client and is only meant for development.
fn absolute_url(state: &AppState, headers: &HeaderMap, path: &str) -> String {
    if let Some(base) = &state.site.site_url {
        return format!("{base}{path}");
    }
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}{path}")
}

/// 302 to the home page
fn redirect_home(set_cookie: Option<String>) -> Response {
    let mut response = (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response();
    if let Some(value) = set_cookie.and_then(|v| HeaderValue::from_str(&v).ok()) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

// ============================================================================
// Handlers
// ============================================================================

/// Home page with the unbound purchase form
pub async fn home(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let messages = flash::from_headers(&headers);
    let page = pages::home(&PurchaseForm::unbound(), &messages, &state.site.publishable_key);
    
    let mut response = Html(page).into_response();
    if !messages.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&flash::clear_cookie()) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

/// Validate the form and hand the buyer to hosted checkout
///
/// A body that is not URL-encoded binds as an empty form, so the buyer sees
/// the field errors rather than a 415.
pub async fn purchase(
    State(state): State<AppState>,
    headers: HeaderMap,
    data: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Response, AppError> {
    let data = match data {
        Ok(Form(data)) => data,
        Err(rejection) => {
            tracing::debug!(%rejection, "Purchase body not URL-encoded; binding empty form");
            HashMap::new()
        }
    };
    let form = PurchaseForm::bind(&data);
    
    let quantity = match form.validate() {
        Ok(quantity) => quantity,
        Err(errors) => {
            tracing::debug!(?errors, "Purchase form rejected");
            return Ok(Html(pages::product_form(&form, Some(&errors))).into_response());
        }
    };
    
    let request = CheckoutRequest::new(
        quantity,
        &absolute_url(&state, &headers, "/purchase_success"),
        absolute_url(&state, &headers, "/"),
    );
    let session = state.gateway.create_session(&request).await?;
    
    let url = session
        .url
        .ok_or_else(|| PaymentError::Stripe("No checkout URL returned".into()))?;
    let location = HeaderValue::from_str(&url)
        .map_err(|_| PaymentError::Stripe(format!("unusable checkout URL: {url}")))?;
    
    tracing::info!(session_id = %session.id, quantity, "Redirecting buyer to checkout");
    Ok((StatusCode::OK, [(HX_REDIRECT, location)]).into_response())
}

/// Landing page after hosted checkout
pub async fn purchase_success(
    State(state): State<AppState>,
    Query(query): Query<PurchaseSuccessQuery>,
) -> Result<Response, AppError> {
    let Some(session_id) = query.session_id else {
        return Ok(redirect_home(None));
    };
    
    match state.gateway.retrieve_session(&session_id).await {
        Ok(_) => Ok(Html(pages::purchase_success(&state.site.publishable_key)).into_response()),
        Err(PaymentError::InvalidRequest(reason)) => {
            tracing::warn!(session_id = %session_id, reason = %reason, "Checkout session lookup rejected");
            let cookie = flash::set_cookie(&[FlashMessage::error(PURCHASE_FAILED_MESSAGE)]);
            Ok(redirect_home(Some(cookie)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Stripe webhook receiver
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> StatusCode {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    
    let event = match state.webhook.parse_event(&body, signature) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Webhook rejected: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };
    
    match state.webhook.handle(event).await {
        Ok(WebhookOutcome::Fulfilled(report)) => {
            tracing::info!(orders = report.orders.len(), "Checkout fulfilled");
            StatusCode::OK
        }
        Ok(WebhookOutcome::Unhandled { event_type }) => {
            tracing::info!(event_type = %event_type, "Webhook event type not handled");
            StatusCode::BAD_REQUEST
        }
        Err(PaymentError::WebhookParse(reason)) => {
            tracing::warn!(reason = %reason, "Webhook payload unreadable");
            StatusCode::BAD_REQUEST
        }
        Err(e) => {
            tracing::error!("Webhook processing error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        payment_gateway: state.gateway.name().to_string(),
        orders_reachable: state.orders.count().await.is_ok(),
    })
}

/// Most recent orders, for staff
pub async fn list_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Order>>, Response> {
    let expected = state.site.admin_token.as_deref().unwrap_or_default();
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default();
    
    let authorized = !expected.is_empty() && bool::from(presented.as_bytes().ct_eq(expected.as_bytes()));
    if !authorized {
        return Err(StatusCode::UNAUTHORIZED.into_response());
    }
    
    let orders = state
        .orders
        .list_recent(ADMIN_ORDER_LIMIT)
        .await
        .map_err(|e| AppError::from(e).into_response())?;
    Ok(Json(orders))
}
