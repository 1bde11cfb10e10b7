//! Outbound Email
//!
//! Messages are plain text. A message with an empty recipient list is
//! never handed to a backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::error::{Result, ShopError};

pub const ORDER_PLACED_SUBJECT: &str = "Your order has been placed";
pub const NEW_ORDER_SUBJECT: &str = "You have a new order!";

/// A single email, possibly addressed to several recipients
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: Vec<String>,
}

impl EmailMessage {
    /// Confirmation sent to the buyer
    pub fn order_placed(from: &str, buyer_name: Option<&str>, buyer_email: &str) -> Self {
        let greeting = buyer_name.filter(|n| !n.trim().is_empty()).unwrap_or("there");
        Self {
            subject: ORDER_PLACED_SUBJECT.into(),
            body: format!(
                "Hi {greeting},\n\
                 Your order has been placed. Thank you for shopping with us!\n\
                 You will receive an email with tracking information shortly.\n\
                 \n\
                 Best,\n\
                 The one product e-commerce Team\n"
            ),
            from: from.into(),
            to: vec![buyer_email.into()],
        }
    }
    
    /// Broadcast to every staff account
    pub fn new_order(from: &str, staff: Vec<String>) -> Self {
        Self {
            subject: NEW_ORDER_SUBJECT.into(),
            body: "Hi team!\n\
                   You have a new order in your shop! Go to the admin page to see it.\n\
                   \n\
                   Best,\n\
                   The one product e-commerce Team\n"
                .into(),
            from: from.into(),
            to: staff,
        }
    }
}

/// Email delivery backend
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;
    
    /// Deliver one message to all of its recipients
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Keeps sent messages in memory (for development and tests)
pub struct MemoryMailer {
    outbox: RwLock<Vec<EmailMessage>>,
}

impl Default for MemoryMailer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self {
            outbox: RwLock::new(Vec::new()),
        }
    }
    
    /// Every message sent so far
    pub fn outbox(&self) -> Vec<EmailMessage> {
        self.outbox
            .read()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    fn name(&self) -> &str {
        "memory"
    }
    
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        if message.to.is_empty() {
            return Err(ShopError::Mail("message has no recipients".into()));
        }
        self.outbox
            .write()
            .map_err(|_| ShopError::Mail("outbox lock poisoned".into()))?
            .push(message.clone());
        Ok(())
    }
}
