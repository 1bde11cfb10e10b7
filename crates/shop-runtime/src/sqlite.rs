//! SQLite Stores
//!
//! Durable `OrderStore` and `AccountStore` implementations backed by a
//! sqlx connection pool. Schema lives in `migrations/` and is applied by
//! [`connect`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use shop_core::{
    Account, AccountStore, NewAccount, NewOrder, Order, OrderStore, Result, ShopError,
};

fn storage(err: impl std::fmt::Display) -> ShopError {
    ShopError::Storage(err.to_string())
}

/// Open a pool for `url` and bring the schema up to date
pub async fn connect(url: &str) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(url)
        .await
        .map_err(storage)?;
    migrate(&pool).await?;
    
    tracing::info!(url = %url, "SQLite store ready");
    Ok(pool)
}

/// Private in-memory database (a single pinned connection)
pub async fn in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .map_err(storage)?;
    migrate(&pool).await?;
    Ok(pool)
}

async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(storage)
}

/// Database row representation of an order.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    quantity: i64,
    name: Option<String>,
    email: Option<String>,
    shipping_details: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = ShopError;

    fn try_from(row: OrderRow) -> Result<Self> {
        Ok(Order {
            id: row.id,
            quantity: u32::try_from(row.quantity)
                .map_err(|_| ShopError::Storage(format!("order {} has invalid quantity", row.id)))?,
            name: row.name,
            email: row.email,
            shipping_details: row.shipping_details,
            created_at: row.created_at,
        })
    }
}

/// SQLite implementation of the `OrderStore` port.
pub struct SqliteOrderStore {
    pool: SqlitePool,
}

impl SqliteOrderStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for SqliteOrderStore {
    async fn create(&self, order: NewOrder) -> Result<Order> {
        order.validate()?;
        let created_at = Utc::now();
        
        let result = sqlx::query(
            "INSERT INTO orders (quantity, name, email, shipping_details, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(i64::from(order.quantity))
        .bind(&order.name)
        .bind(&order.email)
        .bind(&order.shipping_details)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        
        Ok(Order {
            id: result.last_insert_rowid(),
            quantity: order.quantity,
            name: order.name,
            email: order.email,
            shipping_details: order.shipping_details,
            created_at,
        })
    }
    
    async fn list_recent(&self, limit: usize) -> Result<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            "SELECT id, quantity, name, email, shipping_details, created_at \
             FROM orders ORDER BY id DESC LIMIT ?",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        
        rows.into_iter().map(Order::try_from).collect()
    }
    
    async fn count(&self) -> Result<usize> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?;
        usize::try_from(count).map_err(storage)
    }
}

/// Database row representation of an account.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: i64,
    username: String,
    email: String,
    is_staff: bool,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            username: row.username,
            email: row.email,
            is_staff: row.is_staff,
            created_at: row.created_at,
        }
    }
}

/// SQLite implementation of the `AccountStore` port.
pub struct SqliteAccountStore {
    pool: SqlitePool,
}

impl SqliteAccountStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn ensure(&self, account: NewAccount) -> Result<Account> {
        if account.username.trim().is_empty() {
            return Err(ShopError::Validation("username must not be empty".into()));
        }
        
        sqlx::query(
            "INSERT INTO accounts (username, email, is_staff, created_at) \
             VALUES (?, ?, ?, ?) ON CONFLICT (username) DO NOTHING",
        )
        .bind(&account.username)
        .bind(&account.email)
        .bind(account.is_staff)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        
        let row: AccountRow = sqlx::query_as(
            "SELECT id, username, email, is_staff, created_at FROM accounts WHERE username = ?",
        )
        .bind(&account.username)
        .fetch_one(&self.pool)
        .await
        .map_err(storage)?;
        
        Ok(row.into())
    }
    
    async fn staff_emails(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT email FROM accounts WHERE is_staff = TRUE ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(storage)?;
        Ok(rows.into_iter().map(|(email,)| email).collect())
    }
}
