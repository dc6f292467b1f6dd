//! Factor merger (§4.6): builds the service-method call arguments from a
//! tool's `mcp_service_factors` declarations plus the caller's raw args.

use outlook_core::domain::tool::FactorSource;
use outlook_core::domain::Tool;
use serde_json::Value;

/// Converts any top-level `"enabled"`/`"disabled"` string back to a
/// boolean for properties the tool's *original* (pre-compat-transform)
/// schema declares as `type: boolean`, per §4.6's normalize-before-dispatch
/// rule.
pub fn denormalize_bool_strings(tool: &Tool, args: &Value) -> Value {
    let Some(obj) = args.as_object() else { return args.clone() };
    let boolean_props: Vec<&str> = tool
        .input_schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .filter(|(_, schema)| schema.get("type").and_then(Value::as_str) == Some("boolean"))
                .map(|(name, _)| name.as_str())
                .collect()
        })
        .unwrap_or_default();

    let mut result = obj.clone();
    for name in boolean_props {
        if let Some(value) = result.get(name).and_then(Value::as_str) {
            let mapped = match value {
                "enabled" => Some(true),
                "disabled" => Some(false),
                _ => None,
            };
            if let Some(mapped) = mapped {
                result.insert(name.to_string(), Value::Bool(mapped));
            }
        }
    }
    Value::Object(result)
}

/// Builds the arguments passed to `tool.mcp_service.name`, per §4.6 steps
/// 1-2: factor-bound values (internal factors always win, signature-default
/// factors defer to a caller override when present) plus any remaining
/// caller args copied through under their own names.
pub fn merge_call_args(tool: &Tool, args: &Value) -> Value {
    let caller_args = args.as_object().cloned().unwrap_or_default();
    let mut consumed = std::collections::HashSet::new();
    let mut merged = serde_json::Map::new();

    for (key, factor) in &tool.mcp_service_factors {
        consumed.insert(key.clone());
        let value = match factor.source {
            FactorSource::Internal => factor.default_value(),
            FactorSource::SignatureDefaults => caller_args.get(key).cloned().unwrap_or_else(|| factor.default_value()),
        };
        merged.insert(factor.target_param.clone(), value);
    }

    for (key, value) in caller_args {
        if !consumed.contains(&key) {
            merged.insert(key, value);
        }
    }

    Value::Object(merged)
}
