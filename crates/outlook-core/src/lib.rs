//! Outlook MCP Core
//!
//! Shared domain types, validated newtypes, the error taxonomy, and the
//! port traits implemented by the other `outlook-*` crates.

pub mod domain;
pub mod error;
pub mod ports;

pub use domain::*;
pub use error::{CoreError, DomainError};
