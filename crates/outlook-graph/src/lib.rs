//! Outlook MCP Graph URL + Query Engine (component D)
//!
//! Builds Microsoft Graph v1.0 mail endpoint URLs from structured query
//! intent and executes them with bounded 429 retry, implementing
//! `outlook_core::ports::GraphQueryEngine`.

pub mod client;
pub mod error;
pub mod exclude;
pub mod filter;
pub mod query_engine;
pub mod search;
pub mod url;

pub use client::GraphClient;
pub use error::GraphError;
pub use exclude::apply_exclude;
pub use filter::build_filter;
pub use query_engine::GraphMailQueryEngine;
pub use search::SearchBuilder;
pub use url::{GraphMailUrlBuilder, BASE_URL};
