//! Order Fulfillment
//!
//! Turns a completed checkout session into order rows and notifications.
//! Order writes and emails are not transactional: if an email fails after
//! the rows are written, the rows stay.

use async_trait::async_trait;
use std::sync::Arc;

use shop_core::{AccountStore, EmailMessage, Mailer, NewOrder, Order, OrderStore};

use crate::error::Result;
use crate::gateway::{CheckoutGateway, CheckoutSession};

/// What fulfillment did for one session
#[derive(Clone, Debug, Default)]
pub struct FulfillmentReport {
    /// One per line item, in provider order
    pub orders: Vec<Order>,
    
    /// Whether the buyer confirmation went out
    pub buyer_notified: bool,
    
    /// Staff addresses the new-order notice went to
    pub staff_notified: Vec<String>,
}

/// Anything that can fulfil a completed checkout
#[async_trait]
pub trait OrderFulfiller: Send + Sync {
    async fn fulfill(&self, session: &CheckoutSession) -> Result<FulfillmentReport>;
}

/// Records orders and notifies buyer and staff
pub struct FulfillmentService {
    gateway: Arc<dyn CheckoutGateway>,
    orders: Arc<dyn OrderStore>,
    accounts: Arc<dyn AccountStore>,
    mailer: Arc<dyn Mailer>,
    sender: String,
}

impl FulfillmentService {
    pub fn new(
        gateway: Arc<dyn CheckoutGateway>,
        orders: Arc<dyn OrderStore>,
        accounts: Arc<dyn AccountStore>,
        mailer: Arc<dyn Mailer>,
        sender: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            orders,
            accounts,
            mailer,
            sender: sender.into(),
        }
    }
    
    async fn notify_buyer(&self, session: &CheckoutSession) -> Result<bool> {
        let Some(email) = session.customer_email.as_deref().filter(|e| !e.trim().is_empty()) else {
            tracing::warn!(session_id = %session.id, "Checkout has no buyer email; confirmation skipped");
            return Ok(false);
        };
        
        let message = EmailMessage::order_placed(&self.sender, session.customer_name.as_deref(), email);
        self.mailer.send(&message).await?;
        Ok(true)
    }
    
    async fn notify_staff(&self) -> Result<Vec<String>> {
        // Resolved now; accounts promoted later miss this order
        let staff = self.accounts.staff_emails().await?;
        if staff.is_empty() {
            tracing::warn!("No staff accounts; new-order notice skipped");
            return Ok(staff);
        }
        
        let message = EmailMessage::new_order(&self.sender, staff.clone());
        self.mailer.send(&message).await?;
        Ok(staff)
    }
}

#[async_trait]
impl OrderFulfiller for FulfillmentService {
    async fn fulfill(&self, session: &CheckoutSession) -> Result<FulfillmentReport> {
        let line_items = self.gateway.list_line_items(&session.id).await?;
        
        let mut orders = Vec::with_capacity(line_items.len());
        for item in line_items {
            let order = self
                .orders
                .create(NewOrder {
                    quantity: item.quantity,
                    name: session.customer_name.clone(),
                    email: session.customer_email.clone(),
                    shipping_details: session.shipping_details.clone(),
                })
                .await?;
            orders.push(order);
        }
        
        tracing::info!(
            session_id = %session.id,
            orders = orders.len(),
            email = ?session.customer_email,
            "Recorded orders"
        );
        
        let buyer_notified = self.notify_buyer(session).await?;
        let staff_notified = self.notify_staff().await?;
        
        Ok(FulfillmentReport {
            orders,
            buyer_notified,
            staff_notified,
        })
    }
}
