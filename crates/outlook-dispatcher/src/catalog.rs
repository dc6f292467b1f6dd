//! Catalog loader (§4.6): `tool_definition_templates.yaml` is the single
//! source of truth for the dispatcher's `Tool` records.

use outlook_core::domain::Tool;

use crate::error::DispatcherError;

/// Reads and parses the YAML tool catalog at `path`.
pub fn load_tool_definitions(path: &str) -> Result<Vec<Tool>, DispatcherError> {
    let raw = std::fs::read_to_string(path).map_err(|e| DispatcherError::CatalogRead {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    parse_tool_definitions(&raw, path)
}

fn parse_tool_definitions(raw: &str, path: &str) -> Result<Vec<Tool>, DispatcherError> {
    #[derive(serde::Deserialize)]
    struct CatalogFile {
        tools: Vec<Tool>,
    }

    serde_yaml::from_str::<CatalogFile>(raw)
        .map(|file| file.tools)
        .map_err(|e| DispatcherError::CatalogParse {
            path: path.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
tools:
  - name: list_mail
    description: List messages matching filter criteria.
    input_schema:
      type: object
      properties:
        is_read:
          type: boolean
    mcp_service:
      name: query_filter
      signature: ["filter", "select", "exclude", "max_results"]
    mcp_service_factors:
      select:
        source: internal
        type_name: SelectParams
        target_param: select
        description: default field projection
        default: null
        parameters: []
"#;

    #[test]
    fn parses_tools_from_yaml() {
        let tools = parse_tool_definitions(SAMPLE, "inline").unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "list_mail");
        assert_eq!(tools[0].mcp_service.name, "query_filter");
        assert!(tools[0].mcp_service_factors.contains_key("select"));
    }

    #[test]
    fn missing_file_yields_catalog_read_error() {
        let err = load_tool_definitions("/nonexistent/catalog.yaml").unwrap_err();
        assert!(matches!(err, DispatcherError::CatalogRead { .. }));
    }

    #[test]
    fn malformed_yaml_yields_catalog_parse_error() {
        let err = parse_tool_definitions("not: [valid", "inline").unwrap_err();
        assert!(matches!(err, DispatcherError::CatalogParse { .. }));
    }
}
