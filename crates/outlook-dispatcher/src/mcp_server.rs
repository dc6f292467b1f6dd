//! `rmcp::ServerHandler` glue, grounded on
//! `other_examples/.../RustyMail__src-mcp-adapters-sdk.rs`'s
//! `RustyMailService` — `list_tools`/`call_tool` built from a runtime
//! catalog rather than a compile-time tool registry.

use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, ErrorCode, ErrorData, Implementation, InitializeResult,
    ListToolsResult, PaginatedRequestParam, ProtocolVersion, RawContent, RawTextContent, ServerCapabilities,
    ToolsCapability,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler};

use crate::dispatcher::ToolDispatcher;

/// Extracts the caller's mailbox from the tool call's `user_email`
/// argument, required on every tool per §4.1 (there is no ambient session
/// identity at the transport layer; the caller always names the mailbox).
fn extract_user_email(arguments: &Option<serde_json::Map<String, serde_json::Value>>) -> Result<String, ErrorData> {
    arguments
        .as_ref()
        .and_then(|args| args.get("user_email"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ErrorData::new(ErrorCode(-32602), "missing required argument user_email".to_string(), None))
}

fn to_rmcp_tool(tool: &outlook_core::domain::Tool) -> rmcp::model::Tool {
    rmcp::model::Tool {
        name: tool.name.clone().into(),
        description: tool.description.clone().into(),
        input_schema: Arc::new(
            tool.input_schema
                .as_object()
                .cloned()
                .unwrap_or_default(),
        ),
    }
}

fn core_error_to_rmcp(err: outlook_core::error::CoreError) -> ErrorData {
    ErrorData::new(ErrorCode(-32603), err.to_string(), None)
}

#[derive(Clone)]
pub struct OutlookMcpServer {
    dispatcher: Arc<ToolDispatcher>,
}

impl OutlookMcpServer {
    pub fn new(dispatcher: Arc<ToolDispatcher>) -> Self {
        Self { dispatcher }
    }
}

impl ServerHandler for OutlookMcpServer {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: None }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "outlook-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some("Outlook mail access over Microsoft Graph, exposed as MCP tools.".to_string()),
        }
    }

    async fn list_tools(
        &self,
        _request: PaginatedRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        let tools = self.dispatcher.list_tools().iter().map(to_rmcp_tool).collect();
        Ok(ListToolsResult { tools, next_cursor: None })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let user_email = extract_user_email(&request.arguments)?;
        let args = request.arguments.map(serde_json::Value::Object).unwrap_or(serde_json::Value::Null);

        let result = self
            .dispatcher
            .call_tool(&user_email, &request.name, args)
            .await
            .map_err(core_error_to_rmcp)?;

        let text = serde_json::to_string_pretty(&result).unwrap_or_else(|_| "null".to_string());
        Ok(CallToolResult::success(vec![Content {
            raw: RawContent::Text(RawTextContent { text }),
            annotations: None,
        }]))
    }
}
