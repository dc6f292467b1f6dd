//! Tool catalog, factor merger, and MCP dispatch for outlook-mcp
//! (component F, §4.6).

pub mod catalog;
pub mod compat;
pub mod dispatcher;
pub mod error;
pub mod factors;
pub mod invoker;
pub mod mcp_server;

pub use catalog::load_tool_definitions;
pub use dispatcher::ToolDispatcher;
pub use error::DispatcherError;
pub use invoker::ToolInvoker;
pub use mcp_server::OutlookMcpServer;
