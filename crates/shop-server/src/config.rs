//! Server Configuration
//!
//! Read from environment variables (after `.env` is loaded by `main`).

use std::path::PathBuf;
use thiserror::Error;

use shop_payments::{DEFAULT_TOLERANCE_SECS, StripeConfig};
use shop_runtime::ResendConfig;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Everything the server needs to start
#[derive(Clone, Debug)]
pub struct ShopConfig {
    pub stripe: StripeConfig,
    
    /// Sender address on every outbound email
    pub email_sender: String,
    
    pub database_url: String,
    pub bind_addr: String,
    
    /// Public base URL; when unset, absolute URLs come from the (client-supplied)
    /// `Host` header, so production deployments must set it
    pub site_url: Option<String>,
    
    /// Overrides the bundled `static/` directory
    pub static_dir: Option<PathBuf>,
    
    /// Accounts created as staff at startup
    pub staff_emails: Vec<String>,
    
    /// Email via Resend; `None` logs email instead
    pub resend: Option<ResendConfig>,
    
    /// Enables `/admin/orders`
    pub admin_token: Option<String>,
    
    pub webhook_tolerance_secs: i64,
}

impl ShopConfig {
    /// Create from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
    
    /// Create from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let optional = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |name: &'static str| optional(name).ok_or(ConfigError::Missing(name));
        
        let stripe = StripeConfig {
            secret_key: required("STRIPE_SECRET_KEY")?,
            publishable_key: required("STRIPE_PUBLISHABLE_KEY")?,
            price_id: required("STRIPE_PRICE_ID")?,
            webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
        };
        
        let email_sender = required("EMAIL_HOST_USER")?;
        if !email_sender.contains('@') {
            return Err(ConfigError::Invalid {
                name: "EMAIL_HOST_USER",
                reason: "not an email address".into(),
            });
        }
        
        let webhook_tolerance_secs = match optional("WEBHOOK_TOLERANCE_SECS") {
            Some(raw) => raw.parse::<i64>().ok().filter(|s| *s > 0).ok_or_else(|| {
                ConfigError::Invalid {
                    name: "WEBHOOK_TOLERANCE_SECS",
                    reason: format!("expected a positive number of seconds, got {raw:?}"),
                }
            })?,
            None => DEFAULT_TOLERANCE_SECS,
        };
        
        let staff_emails = optional("SHOP_STAFF_EMAILS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        
        Ok(Self {
            stripe,
            email_sender,
            database_url: optional("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://shop.db?mode=rwc".into()),
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
            site_url: optional("SITE_URL").map(|url| url.trim_end_matches('/').to_string()),
            static_dir: optional("STATIC_DIR").map(PathBuf::from),
            staff_emails,
            resend: optional("RESEND_API_KEY").map(ResendConfig::new),
            admin_token: optional("ADMIN_TOKEN"),
            webhook_tolerance_secs,
        })
    }
}
