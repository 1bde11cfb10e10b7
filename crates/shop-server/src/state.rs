//! Application State

use std::path::PathBuf;
use std::sync::Arc;

use shop_core::OrderStore;
use shop_payments::{CheckoutGateway, WebhookHandler};

/// Settings the handlers read on every request
#[derive(Clone, Debug, Default)]
pub struct SiteSettings {
    /// Public base URL without trailing slash
    ///
    /// When unset, redirect URLs are built from the request's `Host` header,
    /// which the client controls. Set it for anything but local development.
    pub site_url: Option<String>,
    
    /// Exposed to the page for Stripe.js
    pub publishable_key: String,
    
    /// Bearer token for `/admin/orders`
    pub admin_token: Option<String>,
    
    /// Directory served under `/static`; the crate's own `static/` when unset
    pub static_dir: Option<PathBuf>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Hosted checkout provider
    pub gateway: Arc<dyn CheckoutGateway>,
    
    /// Signature verification + fulfillment
    pub webhook: Arc<WebhookHandler>,
    
    /// Order records (read by the admin listing and health check)
    pub orders: Arc<dyn OrderStore>,
    
    pub site: SiteSettings,
}
