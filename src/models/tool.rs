use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::action::Action;
use crate::template::path::ReferencePath;

/// Parameter types a tool definition can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    #[default]
    String,
    Number,
    Boolean,
    Object,
}

impl ScalarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Number => "number",
            ScalarType::Boolean => "boolean",
            ScalarType::Object => "object",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub required: bool,
    pub description: String,
    #[serde(rename = "type")]
    pub scalar_type: ScalarType,
}

/// The flat, named parameter schema exposed to a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: BTreeMap<String, ParameterSpec>,
    pub response_type: ScalarType,
}

/// A partial [`ToolDefinition`]; present fields replace the generated ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinitionOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<BTreeMap<String, ParameterSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ScalarType>,
}

impl ToolDefinitionOverride {
    /// Shallow merge: every field set in `other` wins.
    pub fn merge(&mut self, other: &ToolDefinitionOverride) {
        if other.name.is_some() {
            self.name = other.name.clone();
        }
        if other.description.is_some() {
            self.description = other.description.clone();
        }
        if other.parameters.is_some() {
            self.parameters = other.parameters.clone();
        }
        if other.response_type.is_some() {
            self.response_type = other.response_type;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.parameters.is_none()
            && self.response_type.is_none()
    }
}

/// A tool definition plus an optional override and opaque compiler metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec<M> {
    pub definition: ToolDefinition,
    #[serde(rename = "override", default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ToolDefinitionOverride>,
    pub metadata: M,
}

impl<M> ToolSpec<M> {
    pub fn new(definition: ToolDefinition, metadata: M) -> Self {
        Self {
            definition,
            overrides: None,
            metadata,
        }
    }

    /// Shallow-merge `extra` into this spec's override.
    pub fn merge_override(&mut self, extra: &ToolDefinitionOverride) {
        self.overrides
            .get_or_insert_with(ToolDefinitionOverride::default)
            .merge(extra);
    }

    /// The definition a caller sees, with the override applied.
    pub fn effective_definition(&self) -> ToolDefinition {
        let mut definition = self.definition.clone();
        if let Some(ov) = &self.overrides {
            if let Some(name) = &ov.name {
                definition.name = name.clone();
            }
            if let Some(description) = &ov.description {
                definition.description = description.clone();
            }
            if let Some(parameters) = &ov.parameters {
                definition.parameters = parameters.clone();
            }
            if let Some(response_type) = ov.response_type {
                definition.response_type = response_type;
            }
        }
        definition
    }

    pub fn effective_name(&self) -> &str {
        self.overrides
            .as_ref()
            .and_then(|ov| ov.name.as_deref())
            .unwrap_or(&self.definition.name)
    }
}

/// A [`ToolSpec`] tagged with the collection it was emitted from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedToolSpec<M> {
    #[serde(rename = "type")]
    pub tool_type: String,
    #[serde(flatten)]
    pub spec: ToolSpec<M>,
}

/// Compiler metadata for tools generated from action templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutToolMetadata {
    pub template: Action,
    pub parameter_id_to_template_path: BTreeMap<String, ReferencePath>,
}
