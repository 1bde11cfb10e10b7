//! Logging Mailer
//!
//! Writes each message to the tracing log instead of delivering it.
//! Used when no email provider is configured.

use async_trait::async_trait;

use shop_core::{EmailMessage, Mailer, Result, ShopError};

#[derive(Clone, Debug, Default)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for LogMailer {
    fn name(&self) -> &str {
        "log"
    }
    
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        if message.to.is_empty() {
            return Err(ShopError::Mail("message has no recipients".into()));
        }
        
        tracing::info!(
            from = %message.from,
            to = ?message.to,
            subject = %message.subject,
            "Email (not delivered)\n{}",
            message.body
        );
        Ok(())
    }
}
