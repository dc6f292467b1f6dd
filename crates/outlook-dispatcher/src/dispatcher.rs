//! `ToolDispatcher` (§4.6): ties the catalog, factor merger, JSON Schema
//! validation, session-aware token-error handling, and a [`ToolInvoker`]
//! together into the single call path the MCP server exposes.

use std::sync::Arc;

use outlook_core::domain::{Email, Tool};
use outlook_core::error::CoreError;
use outlook_session::SessionManager;
use serde_json::Value;
use tracing::warn;

use crate::compat::apply_boolean_compat;
use crate::error::DispatcherError;
use crate::factors::{denormalize_bool_strings, merge_call_args};
use crate::invoker::ToolInvoker;

pub struct ToolDispatcher {
    catalog: Vec<Tool>,
    session_manager: Arc<SessionManager>,
    invoker: Arc<dyn ToolInvoker>,
}

impl ToolDispatcher {
    pub fn new(catalog: Vec<Tool>, session_manager: Arc<SessionManager>, invoker: Arc<dyn ToolInvoker>) -> Self {
        Self {
            catalog,
            session_manager,
            invoker,
        }
    }

    /// The externally visible tool list, with the boolean-schema
    /// compatibility transform applied (§4.6).
    pub fn list_tools(&self) -> Vec<Tool> {
        self.catalog.iter().map(apply_boolean_compat).collect()
    }

    fn find_tool(&self, name: &str) -> Result<&Tool, DispatcherError> {
        self.catalog
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| DispatcherError::UnknownTool { name: name.to_string() })
    }

    fn validate_args(tool: &Tool, args: &Value) -> Result<(), CoreError> {
        let compiled = jsonschema::JSONSchema::compile(&tool.input_schema)
            .map_err(|e| CoreError::ValidationError { reason: e.to_string() })?;
        if let Err(errors) = compiled.validate(args) {
            let reason = errors.map(|e| e.to_string()).collect::<Vec<_>>().join("; ");
            return Err(CoreError::ValidationError { reason });
        }
        Ok(())
    }

    /// Runs a single tool call end to end: denormalize -> validate -> merge
    /// factors -> invoke -> on a token error, invalidate the session and
    /// surface `AuthenticationRequired` carrying the user's email (§4.6's
    /// token-error handling wrapper).
    pub async fn call_tool(&self, user_email: &str, tool_name: &str, args: Value) -> Result<Value, CoreError> {
        let tool = self.find_tool(tool_name).map_err(CoreError::from)?;

        let denormalized = denormalize_bool_strings(tool, &args);
        Self::validate_args(tool, &denormalized)?;
        let service_args = merge_call_args(tool, &denormalized);

        match self.invoker.invoke(tool, user_email, service_args).await {
            Ok(value) => Ok(value),
            Err(err) if err.requires_session_invalidation() => {
                warn!(user_email, tool_name, "token error during dispatch, invalidating session");
                if let Ok(email) = Email::new(user_email) {
                    self.session_manager.invalidate_session(&email);
                }
                Err(CoreError::AuthenticationRequired {
                    email: user_email.to_string(),
                })
            }
            Err(err) => Err(err),
        }
    }
}
