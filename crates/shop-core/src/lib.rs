//! # shop-core
//!
//! Domain types for a one-product shop: the purchase form, order and
//! account records, outbound email, and the storage ports the rest of
//! the workspace builds on.
//!
//! ## Flow
//!
//! ```text
//! PurchaseForm ──▶ checkout session ──▶ webhook ──▶ OrderStore + Mailer
//!  (validated)      (shop-payments)    (verified)    (one row per item)
//! ```
//!
//! Each port ships with an in-memory implementation; durable ones live in
//! `shop-runtime`.

pub mod account;
pub mod error;
pub mod form;
pub mod mail;
pub mod order;

pub use account::{Account, AccountStore, MemoryAccountStore, NewAccount};
pub use error::{Result, ShopError};
pub use form::{FieldErrors, PurchaseForm};
pub use mail::{EmailMessage, Mailer, MemoryMailer};
pub use order::{MemoryOrderStore, NewOrder, Order, OrderStore};
