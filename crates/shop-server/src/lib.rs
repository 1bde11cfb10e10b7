//! # shop-server
//!
//! Axum front end for the one-product shop: the purchase page, the
//! hosted-checkout round trip, and the Stripe webhook receiver.

pub mod config;
pub mod error;
pub mod flash;
pub mod handlers;
pub mod pages;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::handlers::{health_check, home, list_orders, purchase, purchase_success, webhook};
use crate::state::AppState;

/// Assets bundled with the crate, independent of the working directory
pub const BUNDLED_STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build the application router
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(home))
        .route("/purchase", post(purchase))
        .route("/purchase_success", get(purchase_success))
        // Called by Stripe, not a browser: no CSRF protection
        .route("/webhook", post(webhook))
        .route("/health", get(health_check));
    
    if state.site.admin_token.is_some() {
        app = app.route("/admin/orders", get(list_orders));
    }
    
    let static_dir = state
        .site
        .static_dir
        .clone()
        .unwrap_or_else(|| BUNDLED_STATIC_DIR.into());
    
    app.nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
