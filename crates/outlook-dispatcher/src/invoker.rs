//! The seam between catalog-driven dispatch and the concrete service
//! methods a tool's `mcp_service.name` identifies. `outlook-dispatcher`
//! knows how to load a catalog and merge factors; it does not know how to
//! call Graph or the attachment pipeline — `outlook-server` wires a
//! [`ToolInvoker`] impl that does, keeping this crate's dependency surface
//! to the catalog/session ports only.

use async_trait::async_trait;
use outlook_core::domain::Tool;
use outlook_core::error::CoreError;
use serde_json::Value;

/// Invokes the service method a [`Tool`] is bound to, with `service_args`
/// already built by [`crate::factors::merge_call_args`].
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, tool: &Tool, user_email: &str, service_args: Value) -> Result<Value, CoreError>;
}
