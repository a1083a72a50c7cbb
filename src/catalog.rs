//! Action and app-intent definition lookups.
//!
//! The spec generator never reads host metadata itself; it is handed these
//! tables at construction. [`StaticCatalog`] loads them from JSON exports of
//! WorkflowKit's `WFActions.plist` and of app bundles' `extract.actionsdata`.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionDescription {
    #[serde(rename = "DescriptionSummary", default)]
    pub summary: Option<String>,
    #[serde(rename = "DescriptionNote", default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Class", default)]
    pub class: Option<String>,
    #[serde(rename = "Label", default)]
    pub label: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "DefaultValue", default)]
    pub default_value: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputDefinition {
    #[serde(rename = "OutputName", default)]
    pub name: Option<String>,
    #[serde(rename = "Types", default)]
    pub types: Option<Vec<String>>,
}

/// Definition of one built-in action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: Option<ActionDescription>,
    #[serde(rename = "Parameters", default)]
    pub parameters: Option<Vec<ParameterDefinition>>,
    #[serde(rename = "Output", default)]
    pub output: Option<OutputDefinition>,
}

impl ActionDefinition {
    pub fn parameter(&self, key: &str) -> Option<&ParameterDefinition> {
        self.parameters.as_ref()?.iter().find(|p| p.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizedKey {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentParameterDefinition {
    pub name: String,
    pub title: LocalizedKey,
    pub is_optional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentDescriptionMetadata {
    pub description_text: LocalizedKey,
}

/// Definition of one action an application exposes through App Intents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentActionDefinition {
    pub identifier: String,
    pub title: LocalizedKey,
    #[serde(default)]
    pub parameters: Option<Vec<IntentParameterDefinition>>,
    #[serde(default)]
    pub description_metadata: Option<IntentDescriptionMetadata>,
}

impl IntentActionDefinition {
    pub fn parameter(&self, name: &str) -> Option<&IntentParameterDefinition> {
        self.parameters.as_ref()?.iter().find(|p| p.name == name)
    }

    pub fn description(&self) -> Option<&str> {
        self.description_metadata
            .as_ref()
            .map(|m| m.description_text.key.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleIntents {
    #[serde(default)]
    pub actions: HashMap<String, IntentActionDefinition>,
}

/// Lookup of built-in action definitions by action identifier.
pub trait ActionLookup {
    fn action(&self, identifier: &str) -> Option<&ActionDefinition>;
}

/// Lookup of app-intent actions scoped by bundle identifier.
pub trait IntentLookup {
    fn intent(&self, bundle_id: &str, intent_id: &str) -> Option<&IntentActionDefinition>;
}

/// In-memory lookup tables.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    actions: HashMap<String, ActionDefinition>,
    bundles: HashMap<String, BundleIntents>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_action(mut self, identifier: impl Into<String>, definition: ActionDefinition) -> Self {
        self.actions.insert(identifier.into(), definition);
        self
    }

    #[cfg(test)]
    pub fn with_intent(mut self, bundle_id: impl Into<String>, definition: IntentActionDefinition) -> Self {
        self.bundles
            .entry(bundle_id.into())
            .or_default()
            .actions
            .insert(definition.identifier.clone(), definition);
        self
    }

    /// Parse an action table: a JSON object keyed by action identifier.
    /// Entries that do not match the definition shape are skipped.
    pub fn load_actions_json(&mut self, json: &str) -> Result<usize> {
        let raw: HashMap<String, Value> = serde_json::from_str(json)?;
        let mut loaded = 0;
        for (identifier, entry) in raw {
            match serde_json::from_value::<ActionDefinition>(entry) {
                Ok(definition) => {
                    self.actions.insert(identifier, definition);
                    loaded += 1;
                }
                Err(e) => {
                    tracing::debug!("Skipping action definition {}: {}", identifier, e);
                }
            }
        }
        Ok(loaded)
    }

    /// Parse an intent table: a JSON object keyed by bundle identifier.
    pub fn load_intents_json(&mut self, json: &str) -> Result<usize> {
        let raw: HashMap<String, Value> = serde_json::from_str(json)?;
        let mut loaded = 0;
        for (bundle_id, entry) in raw {
            match serde_json::from_value::<BundleIntents>(entry) {
                Ok(bundle) => {
                    loaded += bundle.actions.len();
                    self.bundles.insert(bundle_id, bundle);
                }
                Err(e) => {
                    tracing::debug!("Skipping intents of {}: {}", bundle_id, e);
                }
            }
        }
        Ok(loaded)
    }

    /// Build a catalog from optional table files.
    pub fn from_files(actions: Option<&Path>, intents: Option<&Path>) -> Result<Self> {
        let mut catalog = Self::new();
        if let Some(path) = actions {
            let count = catalog.load_actions_json(&std::fs::read_to_string(path)?)?;
            tracing::info!("Loaded {} action definitions from {}", count, path.display());
        }
        if let Some(path) = intents {
            let count = catalog.load_intents_json(&std::fs::read_to_string(path)?)?;
            tracing::info!("Loaded {} intent definitions from {}", count, path.display());
        }
        Ok(catalog)
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }
}

impl ActionLookup for StaticCatalog {
    fn action(&self, identifier: &str) -> Option<&ActionDefinition> {
        self.actions.get(identifier)
    }
}

impl IntentLookup for StaticCatalog {
    fn intent(&self, bundle_id: &str, intent_id: &str) -> Option<&IntentActionDefinition> {
        self.bundles.get(bundle_id)?.actions.get(intent_id)
    }
}
