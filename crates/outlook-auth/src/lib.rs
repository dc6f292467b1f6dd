//! Outlook MCP Auth Service
//!
//! Confidential-client OAuth2 authorization-code and refresh-token grants
//! against Azure AD, implementing `outlook_core::ports::AuthProvider`.

pub mod client;
pub mod error;

pub use client::AzureAuthProvider;
pub use error::AuthError;
