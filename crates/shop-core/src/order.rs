//! Order Records
//!
//! One order row is written per line item of a completed checkout session.
//! Orders are append-only: there is no update or delete path.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::error::{Result, ShopError};

/// A persisted order line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Store-assigned identifier
    pub id: i64,
    
    /// Units purchased on this line
    pub quantity: u32,
    
    /// Buyer display name
    pub name: Option<String>,
    
    /// Buyer email address
    pub email: Option<String>,
    
    /// Free-text shipping address
    pub shipping_details: Option<String>,
    
    /// Set once at insertion
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Order {} - {} units", self.id, self.quantity)
    }
}

/// Fields supplied by the caller when recording an order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub quantity: u32,
    pub name: Option<String>,
    pub email: Option<String>,
    pub shipping_details: Option<String>,
}

impl NewOrder {
    pub fn new(quantity: u32) -> Self {
        Self {
            quantity,
            ..Default::default()
        }
    }
    
    /// Reject orders that could never come from a real line item
    pub fn validate(&self) -> Result<()> {
        if self.quantity == 0 {
            return Err(ShopError::Validation("order quantity must be positive".into()));
        }
        Ok(())
    }
}

/// Order storage trait
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new order, assigning its id and creation time
    async fn create(&self, order: NewOrder) -> Result<Order>;
    
    /// Most recent orders first
    async fn list_recent(&self, limit: usize) -> Result<Vec<Order>>;
    
    /// Total number of stored orders
    async fn count(&self) -> Result<usize>;
}

/// In-memory order store (for development and tests)
pub struct MemoryOrderStore {
    orders: RwLock<Vec<Order>>,
}

impl Default for MemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(Vec::new()),
        }
    }
    
    /// Snapshot of every stored order, oldest first
    pub fn all(&self) -> Vec<Order> {
        self.orders
            .read()
            .map(|orders| orders.clone())
            .unwrap_or_default()
    }
}

fn poisoned() -> ShopError {
    ShopError::Storage("order store lock poisoned".into())
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn create(&self, order: NewOrder) -> Result<Order> {
        order.validate()?;
        
        let mut orders = self.orders.write().map_err(|_| poisoned())?;
        let id = orders.last().map_or(1, |last| last.id + 1);
        
        let stored = Order {
            id,
            quantity: order.quantity,
            name: order.name,
            email: order.email,
            shipping_details: order.shipping_details,
            created_at: Utc::now(),
        };
        orders.push(stored.clone());
        
        Ok(stored)
    }
    
    async fn list_recent(&self, limit: usize) -> Result<Vec<Order>> {
        let orders = self.orders.read().map_err(|_| poisoned())?;
        Ok(orders.iter().rev().take(limit).cloned().collect())
    }
    
    async fn count(&self) -> Result<usize> {
        let orders = self.orders.read().map_err(|_| poisoned())?;
        Ok(orders.len())
    }
}
