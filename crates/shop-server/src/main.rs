//! one-product-shop HTTP Server
//!
//! Serves the purchase page, starts Stripe hosted checkouts and records
//! orders when Stripe reports a completed checkout.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shop_core::{AccountStore, Mailer, NewAccount};
use shop_payments::{FulfillmentService, StripeGateway, WebhookHandler, WebhookVerifier};
use shop_runtime::{LogMailer, ResendMailer, SqliteAccountStore, SqliteOrderStore, sqlite};

use shop_server::config::ShopConfig;
use shop_server::state::{AppState, SiteSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ShopConfig::from_env()?;

    // Storage
    let pool = sqlite::connect(&config.database_url).await?;
    let orders = Arc::new(SqliteOrderStore::new(pool.clone()));
    let accounts = Arc::new(SqliteAccountStore::new(pool));

    for email in &config.staff_emails {
        let account = accounts.ensure(NewAccount::staff(email.clone())).await?;
        tracing::info!(username = %account.username, "Staff account ready");
    }
    if config.staff_emails.is_empty() {
        tracing::warn!("No SHOP_STAFF_EMAILS configured - new-order notices will be skipped");
    }

    // Email
    let mailer: Arc<dyn Mailer> = match config.resend.clone() {
        Some(resend) => Arc::new(ResendMailer::new(resend)),
        None => {
            tracing::warn!("RESEND_API_KEY not set - emails will only be logged");
            Arc::new(LogMailer::new())
        }
    };
    tracing::info!(mailer = mailer.name(), "Mailer configured");

    // Payments
    let gateway = Arc::new(StripeGateway::from_config(&config.stripe));
    let fulfillment = Arc::new(FulfillmentService::new(
        gateway.clone(),
        orders.clone(),
        accounts,
        mailer,
        config.email_sender.clone(),
    ));
    let verifier = WebhookVerifier::new(config.stripe.webhook_secret.clone())
        .with_tolerance(config.webhook_tolerance_secs);

    let state = AppState {
        gateway,
        webhook: Arc::new(WebhookHandler::new(verifier, fulfillment)),
        orders,
        site: SiteSettings {
            site_url: config.site_url.clone(),
            publishable_key: config.stripe.publishable_key.clone(),
            admin_token: config.admin_token.clone(),
            static_dir: config.static_dir.clone(),
        },
    };

    if config.site_url.is_none() {
        tracing::warn!("SITE_URL not set - checkout redirect URLs will trust the request Host header");
    }

    let app = shop_server::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("shop server running on http://{}", config.bind_addr);
    tracing::info!("  GET  /                 - Purchase page");
    tracing::info!("  POST /purchase         - Start checkout");
    tracing::info!("  GET  /purchase_success - Checkout return");
    tracing::info!("  POST /webhook          - Stripe webhook");
    tracing::info!("  GET  /health           - Health check");
    if config.admin_token.is_some() {
        tracing::info!("  GET  /admin/orders     - Recent orders (bearer token)");
    }

    axum::serve(listener, app).await?;

    Ok(())
}
