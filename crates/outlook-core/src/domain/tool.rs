//! `Tool` and `Factor` — the tool-catalog record shape (§3, §4.6).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a [`Factor`]'s value comes from at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorSource {
    /// Hidden from the caller entirely; always bound from the factor's
    /// declared defaults.
    Internal,
    /// Visible to the caller; caller-supplied value wins, factor defaults
    /// are the fallback.
    SignatureDefaults,
}

/// One parameter of a composite [`Factor`] value (e.g. one field of an
/// `ExcludeParams`-shaped factor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorParam {
    pub name: String,
    pub default: Option<Value>,
}

/// A per-tool-parameter descriptor overriding or hiding a service-method
/// parameter (see GLOSSARY). `target_param` is the actual service-method
/// parameter name the merged value binds to, and may differ from the
/// catalog key this factor is declared under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Factor {
    pub source: FactorSource,
    /// Type name of the factor's value, e.g. `"ExcludeParams"`, `"boolean"`.
    /// Also informs the dispatcher which composite parameter type to
    /// instantiate when `type_name` matches a known structured type per
    /// §4.6 ("Factors whose type names match known composite parameter
    /// types ... are instantiated as those structured values").
    pub type_name: String,
    pub target_param: String,
    pub description: String,
    /// Scalar default, for primitive-typed factors.
    pub default: Option<Value>,
    /// Field defaults, for composite-typed factors. Per §3's invariant, a
    /// factor with an empty `parameters` list and no scalar `default` is
    /// prunable (should not exist in a saved catalog).
    pub parameters: Vec<FactorParam>,
}

impl Factor {
    /// A composite factor is one with one or more named sub-parameters.
    pub fn is_composite(&self) -> bool {
        !self.parameters.is_empty()
    }

    /// Builds the JSON value this factor contributes when its source is
    /// `internal`, or when `signature_defaults` and the caller omitted an
    /// override: scalar default if primitive, else an object built from
    /// `parameters[*].default`.
    pub fn default_value(&self) -> Value {
        if self.is_composite() {
            let mut map = serde_json::Map::new();
            for param in &self.parameters {
                if let Some(default) = &param.default {
                    map.insert(param.name.clone(), default.clone());
                }
            }
            Value::Object(map)
        } else {
            self.default.clone().unwrap_or(Value::Null)
        }
    }
}

/// A record in the tool catalog (§3, §4.6, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub mcp_service: McpServiceBinding,
    #[serde(default)]
    pub mcp_service_factors: std::collections::BTreeMap<String, Factor>,
}

/// Binds a [`Tool`] to the underlying service method it invokes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServiceBinding {
    pub name: String,
    #[serde(default)]
    pub signature: Vec<String>,
}
