//! Resend Mailer
//!
//! Delivers email through the Resend HTTP API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use shop_core::{EmailMessage, Mailer, Result, ShopError};

const DEFAULT_ENDPOINT: &str = "https://api.resend.com/emails";

/// Resend configuration
#[derive(Clone, Debug)]
pub struct ResendConfig {
    /// API key (`re_...`)
    pub api_key: String,
    
    /// Emails endpoint
    pub endpoint: String,
}

impl ResendConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.into(),
        }
    }
    
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

/// Resend-backed mailer
pub struct ResendMailer {
    client: reqwest::Client,
    config: ResendConfig,
}

impl ResendMailer {
    pub fn new(config: ResendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
    
    fn request_body<'a>(message: &'a EmailMessage) -> SendEmailRequest<'a> {
        SendEmailRequest {
            from: &message.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.body,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    fn name(&self) -> &str {
        "resend"
    }
    
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        if message.to.is_empty() {
            return Err(ShopError::Mail("message has no recipients".into()));
        }
        
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&Self::request_body(message))
            .send()
            .await
            .map_err(|e| ShopError::Mail(e.to_string()))?;
        
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ShopError::Mail(format!("Resend returned {status}: {detail}")));
        }
        
        let sent: SendEmailResponse = response
            .json()
            .await
            .map_err(|e| ShopError::Mail(e.to_string()))?;
        
        tracing::info!(
            message_id = %sent.id,
            subject = %message.subject,
            recipients = message.to.len(),
            "Email sent"
        );
        Ok(())
    }
}
