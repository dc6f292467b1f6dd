//! Boolean-schema compatibility transform (§4.6), applied only to the
//! externally visible tool list — dispatch-time argument interpretation
//! always normalizes back to boolean first (see [`crate::factors::denormalize_bool_strings`]).

use outlook_core::domain::Tool;
use serde_json::Value;

/// Rewrites every `type: boolean` property of `schema` to
/// `type: string, enum: ["enabled", "disabled"]`, remapping a `true`/`false`
/// `default` accordingly. Non-boolean properties and all other schema
/// structure pass through unchanged.
pub fn transform_boolean_properties(schema: &Value) -> Value {
    let mut schema = schema.clone();
    let Some(properties) = schema.get_mut("properties").and_then(Value::as_object_mut) else {
        return schema;
    };

    for property in properties.values_mut() {
        let Some(obj) = property.as_object_mut() else { continue };
        if obj.get("type").and_then(Value::as_str) != Some("boolean") {
            continue;
        }
        obj.insert("type".to_string(), Value::String("string".to_string()));
        obj.insert(
            "enum".to_string(),
            Value::Array(vec![Value::String("enabled".to_string()), Value::String("disabled".to_string())]),
        );
        if let Some(default) = obj.get("default").and_then(Value::as_bool) {
            let mapped = if default { "enabled" } else { "disabled" };
            obj.insert("default".to_string(), Value::String(mapped.to_string()));
        }
    }

    schema
}

/// Returns a clone of `tool` with [`transform_boolean_properties`] applied
/// to its `input_schema`, for use in an externally visible tool listing.
pub fn apply_boolean_compat(tool: &Tool) -> Tool {
    let mut tool = tool.clone();
    tool.input_schema = transform_boolean_properties(&tool.input_schema);
    tool
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rewrites_boolean_property_to_enum_string() {
        let schema = json!({
            "type": "object",
            "properties": {
                "is_read": { "type": "boolean", "default": true },
                "subject": { "type": "string" },
            },
        });
        let transformed = transform_boolean_properties(&schema);
        let is_read = &transformed["properties"]["is_read"];
        assert_eq!(is_read["type"], "string");
        assert_eq!(is_read["enum"], json!(["enabled", "disabled"]));
        assert_eq!(is_read["default"], "enabled");
        assert_eq!(transformed["properties"]["subject"]["type"], "string");
    }

    #[test]
    fn false_default_maps_to_disabled() {
        let schema = json!({ "properties": { "flag": { "type": "boolean", "default": false } } });
        let transformed = transform_boolean_properties(&schema);
        assert_eq!(transformed["properties"]["flag"]["default"], "disabled");
    }

    #[test]
    fn schema_without_properties_is_unchanged() {
        let schema = json!({ "type": "string" });
        assert_eq!(transform_boolean_properties(&schema), schema);
    }
}
