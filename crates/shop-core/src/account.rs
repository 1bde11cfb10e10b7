//! User Accounts
//!
//! Accounts exist only to answer one question: who receives new-order
//! notifications. Staff recipients are resolved at call time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{Result, ShopError};

/// A user account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Internal operator, eligible for new-order notifications
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating an account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub is_staff: bool,
}

impl NewAccount {
    /// Staff account keyed by its email address
    pub fn staff(email: impl Into<String>) -> Self {
        let email = email.into();
        Self {
            username: email.clone(),
            email,
            is_staff: true,
        }
    }
}

/// Account storage trait
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create an account; an existing username is returned unchanged
    async fn ensure(&self, account: NewAccount) -> Result<Account>;
    
    /// Email addresses of every account flagged staff right now
    async fn staff_emails(&self) -> Result<Vec<String>>;
}

/// In-memory account store (for development and tests)
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl Default for MemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
        }
    }
}

fn poisoned() -> ShopError {
    ShopError::Storage("account store lock poisoned".into())
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn ensure(&self, account: NewAccount) -> Result<Account> {
        if account.username.trim().is_empty() {
            return Err(ShopError::Validation("username must not be empty".into()));
        }
        
        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;
        if let Some(existing) = accounts.get(&account.username) {
            return Ok(existing.clone());
        }
        
        let id = i64::try_from(accounts.len()).unwrap_or(i64::MAX - 1) + 1;
        let stored = Account {
            id,
            username: account.username.clone(),
            email: account.email,
            is_staff: account.is_staff,
            created_at: Utc::now(),
        };
        accounts.insert(account.username, stored.clone());
        
        Ok(stored)
    }
    
    async fn staff_emails(&self) -> Result<Vec<String>> {
        let accounts = self.accounts.read().map_err(|_| poisoned())?;
        let mut staff: Vec<&Account> = accounts.values().filter(|a| a.is_staff).collect();
        staff.sort_by_key(|a| a.id);
        Ok(staff.into_iter().map(|a| a.email.clone()).collect())
    }
}
