//! The emitted tool catalog: a frozen, ordered list of tagged specs.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Result, ToolboxError};
use crate::models::{TaggedToolSpec, ToolDefinition};

/// Tool entry in the form MCP clients list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpTool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl From<&ToolDefinition> for McpTool {
    fn from(definition: &ToolDefinition) -> Self {
        let properties: serde_json::Map<String, Value> = definition
            .parameters
            .iter()
            .map(|(name, param)| {
                (
                    name.clone(),
                    json!({
                        "type": param.scalar_type.as_str(),
                        "description": param.description,
                    }),
                )
            })
            .collect();
        let required: Vec<&String> = definition
            .parameters
            .iter()
            .filter(|(_, param)| param.required)
            .map(|(name, _)| name)
            .collect();

        Self {
            name: definition.name.clone(),
            description: definition.description.clone(),
            input_schema: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolCatalog<M> {
    specs: Vec<TaggedToolSpec<M>>,
}

impl<M> ToolCatalog<M> {
    pub fn new(specs: Vec<TaggedToolSpec<M>>) -> Self {
        let catalog = Self { specs };
        for name in catalog.duplicate_names() {
            tracing::warn!("Tool name {} is used more than once, lookups return the first", name);
        }
        catalog
    }

    pub fn specs(&self) -> &[TaggedToolSpec<M>] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// First spec whose effective name is `name`.
    pub fn find(&self, name: &str) -> Option<&TaggedToolSpec<M>> {
        self.specs.iter().find(|t| t.spec.effective_name() == name)
    }

    /// Like [`find`](Self::find), as an error when absent.
    pub fn get(&self, name: &str) -> Result<&TaggedToolSpec<M>> {
        self.find(name)
            .ok_or_else(|| ToolboxError::ToolNotFound(name.to_string()))
    }

    /// Effective names that appear more than once, sorted.
    pub fn duplicate_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut duplicates = BTreeSet::new();
        for tagged in &self.specs {
            let name = tagged.spec.effective_name();
            if !seen.insert(name) {
                duplicates.insert(name.to_string());
            }
        }
        duplicates.into_iter().collect()
    }

    /// Definitions with overrides applied, in catalog order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.specs
            .iter()
            .map(|t| t.spec.effective_definition())
            .collect()
    }

    pub fn mcp_tools(&self) -> Vec<McpTool> {
        self.definitions().iter().map(McpTool::from).collect()
    }
}

impl<M: Serialize> ToolCatalog<M> {
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let text = if pretty {
            serde_json::to_string_pretty(&self.specs)?
        } else {
            serde_json::to_string(&self.specs)?
        };
        Ok(text)
    }

    pub fn write_to(&self, path: &Path, pretty: bool) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json(pretty)?)?;
        tracing::info!("Wrote {} tools to {}", self.len(), path.display());
        Ok(())
    }
}

impl<M: DeserializeOwned> ToolCatalog<M> {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParameterSpec, ScalarType, ToolDefinitionOverride, ToolSpec};
    use pretty_assertions::assert_eq;

    fn tagged(name: &str, params: &[(&str, bool)]) -> TaggedToolSpec<Value> {
        let parameters = params
            .iter()
            .map(|(p, required)| {
                (
                    p.to_string(),
                    ParameterSpec {
                        required: *required,
                        description: format!("about {}", p),
                        scalar_type: ScalarType::String,
                    },
                )
            })
            .collect();
        TaggedToolSpec {
            tool_type: "shortcut".into(),
            spec: ToolSpec::new(
                ToolDefinition {
                    name: name.into(),
                    description: format!("{} tool", name),
                    parameters,
                    response_type: ScalarType::String,
                },
                json!({ "source": name }),
            ),
        }
    }

    #[test]
    fn test_find_uses_effective_name() {
        let mut renamed = tagged("is.workflow.actions.gettext", &[]);
        renamed.spec.merge_override(&ToolDefinitionOverride {
            name: Some("get_text".into()),
            ..Default::default()
        });
        let catalog = ToolCatalog::new(vec![tagged("a", &[]), renamed]);

        assert!(catalog.find("get_text").is_some());
        assert!(catalog.find("is.workflow.actions.gettext").is_none());
        assert!(matches!(
            catalog.get("missing"),
            Err(ToolboxError::ToolNotFound(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_duplicate_names_return_first() {
        let mut first = tagged("dup", &[]);
        first.spec.definition.description = "first".into();
        let catalog = ToolCatalog::new(vec![first, tagged("dup", &[]), tagged("other", &[])]);

        assert_eq!(catalog.duplicate_names(), vec!["dup".to_string()]);
        assert_eq!(catalog.find("dup").unwrap().spec.definition.description, "first");
    }

    #[test]
    fn test_mcp_tool_schema() {
        let catalog = ToolCatalog::new(vec![tagged("t", &[("a", true), ("b", false)])]);
        let tools = catalog.mcp_tools();
        assert_eq!(
            serde_json::to_value(&tools[0]).unwrap(),
            json!({
                "name": "t",
                "description": "t tool",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "a": { "type": "string", "description": "about a" },
                        "b": { "type": "string", "description": "about b" }
                    },
                    "required": ["a"]
                }
            })
        );
    }

    #[test]
    fn test_write_and_read_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("catalog.json");
        let catalog = ToolCatalog::new(vec![tagged("x", &[("p", true)])]);
        catalog.write_to(&path, true).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let raw: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(raw[0]["type"], "shortcut");
        assert_eq!(raw[0]["definition"]["name"], "x");

        let back: ToolCatalog<Value> = ToolCatalog::read_from(&path).unwrap();
        assert_eq!(back, catalog);
    }
}
