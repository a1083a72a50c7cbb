use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// One concrete automation step: an identifier plus its parameter tree.
///
/// Equality is structural; mapping key order does not matter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "WFWorkflowActionIdentifier")]
    pub identifier: String,
    #[serde(rename = "WFWorkflowActionParameters", default)]
    pub parameters: Map<String, Value>,
}

impl Action {
    pub fn new(identifier: impl Into<String>, parameters: Value) -> Self {
        let parameters = match parameters {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            identifier: identifier.into(),
            parameters,
        }
    }

    /// Parameter tree as a standalone node.
    pub fn parameters_node(&self) -> Value {
        Value::Object(self.parameters.clone())
    }

    /// The output identifier other actions use to reference this action.
    pub fn uuid(&self) -> Option<&str> {
        self.parameters.get("UUID").and_then(|v| v.as_str())
    }

    /// `(bundle id, intent id)` when the action targets an app intent.
    pub fn app_intent(&self) -> Option<(&str, &str)> {
        let descriptor = self.parameters.get("AppIntentDescriptor")?;
        let bundle = descriptor.get("BundleIdentifier")?.as_str()?;
        let intent = descriptor.get("AppIntentIdentifier")?.as_str()?;
        Some((bundle, intent))
    }
}

pub const CLIENT_VERSION: &str = "2038.0.2.4";
pub const MINIMUM_CLIENT_VERSION: u32 = 900;
const ICON_START_COLOR: i64 = -2873601;
const ICON_GLYPH_NUMBER: i64 = 61440;

/// A complete shortcut workflow document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(rename = "WFWorkflowClientVersion", default = "default_client_version")]
    pub client_version: String,
    #[serde(
        rename = "WFWorkflowMinimumClientVersion",
        default = "default_minimum_client_version"
    )]
    pub minimum_client_version: u32,
    #[serde(rename = "WFWorkflowIcon", default = "default_icon")]
    pub icon: Value,
    #[serde(rename = "WFQuickActionSurfaces", default = "default_quick_action_surfaces")]
    pub quick_action_surfaces: Vec<String>,
    #[serde(rename = "WFWorkflowImportQuestions", default)]
    pub import_questions: Vec<Value>,
    #[serde(
        rename = "WFWorkflowInputContentItemClasses",
        default = "default_content_item_classes"
    )]
    pub input_content_item_classes: Vec<String>,
    #[serde(
        rename = "WFWorkflowOutputContentItemClasses",
        default = "default_content_item_classes"
    )]
    pub output_content_item_classes: Vec<String>,
    #[serde(rename = "WFWorkflowHasOutputFallback", default)]
    pub has_output_fallback: bool,
    #[serde(rename = "WFWorkflowActions", default)]
    pub actions: Vec<Action>,
}

fn default_client_version() -> String {
    CLIENT_VERSION.to_string()
}
fn default_minimum_client_version() -> u32 {
    MINIMUM_CLIENT_VERSION
}
fn default_icon() -> Value {
    json!({
        "WFWorkflowIconStartColor": ICON_START_COLOR,
        "WFWorkflowIconGlyphNumber": ICON_GLYPH_NUMBER,
    })
}
fn default_quick_action_surfaces() -> Vec<String> {
    vec![String::new()]
}
fn default_content_item_classes() -> Vec<String> {
    vec![
        "WFAppContentItem".to_string(),
        "WFStringContentItem".to_string(),
    ]
}

impl Workflow {
    /// Wrap actions in a workflow carrying the standard header fields.
    pub fn new(actions: Vec<Action>) -> Self {
        Self {
            client_version: default_client_version(),
            minimum_client_version: default_minimum_client_version(),
            icon: default_icon(),
            quick_action_surfaces: default_quick_action_surfaces(),
            import_questions: Vec::new(),
            input_content_item_classes: default_content_item_classes(),
            output_content_item_classes: default_content_item_classes(),
            has_output_fallback: false,
            actions,
        }
    }
}
