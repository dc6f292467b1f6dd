//! Outlook MCP Token Store
//!
//! SQLite-backed persistence for [`outlook_core::domain::UserRecord`] and
//! [`outlook_core::domain::TokenRecord`], implementing the
//! `outlook_core::ports::TokenStore` port.

pub mod error;
pub mod locks;
pub mod pool;
pub mod repository;

pub use error::StoreError;
pub use pool::DatabasePool;
pub use repository::SqliteTokenStore;
