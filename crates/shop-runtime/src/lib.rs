//! # shop-runtime
//!
//! Concrete integrations behind the `shop-core` ports.
//!
//! ## Providers
//!
//! - **SQLite** (default): durable order and account stores via sqlx
//! - **Resend**: email delivery over the Resend HTTP API
//! - **Log**: email written to the tracing log, for development
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shop_runtime::sqlite::{self, SqliteOrderStore};
//!
//! let pool = sqlite::connect("sqlite://shop.db?mode=rwc").await?;
//! let orders = Arc::new(SqliteOrderStore::new(pool));
//! ```

pub mod log_mailer;
pub mod resend;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use log_mailer::LogMailer;
pub use resend::{ResendConfig, ResendMailer};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteAccountStore, SqliteOrderStore};

// Re-export core types for convenience
pub use shop_core::{AccountStore, Mailer, OrderStore, Result, ShopError};
