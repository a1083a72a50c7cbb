//! Spec generation: one tool definition plus path map per concrete action.

use std::collections::{BTreeMap, HashMap};

use crate::catalog::{
    ActionDefinition, ActionLookup, IntentActionDefinition, IntentLookup,
    IntentParameterDefinition, ParameterDefinition,
};
use crate::error::Result;
use crate::models::{
    Action, ParameterSpec, ScalarType, ShortcutToolMetadata, ToolDefinition, ToolSpec,
};
use crate::template::{find_references, CollisionPolicy, ParameterNamer};

pub type ShortcutToolSpec = ToolSpec<ShortcutToolMetadata>;

/// Turns an item into a tool spec. The repository is generic over this.
pub trait GenerateSpec<T> {
    type Metadata;

    fn generate(&self, item: &T) -> Result<ToolSpec<Self::Metadata>>;
}

/// Spec generator for shortcut actions, backed by injected lookups.
pub struct ShortcutSpecGenerator<A, I> {
    actions: A,
    intents: I,
    policy: CollisionPolicy,
}

impl<A: ActionLookup, I: IntentLookup> ShortcutSpecGenerator<A, I> {
    pub fn new(actions: A, intents: I, policy: CollisionPolicy) -> Self {
        Self {
            actions,
            intents,
            policy,
        }
    }
}

impl<A: ActionLookup, I: IntentLookup> GenerateSpec<Action> for ShortcutSpecGenerator<A, I> {
    type Metadata = ShortcutToolMetadata;

    fn generate(&self, action: &Action) -> Result<ShortcutToolSpec> {
        let action_def = self.actions.action(&action.identifier);
        let intent_def = action
            .app_intent()
            .and_then(|(bundle, intent)| self.intents.intent(bundle, intent));
        if action_def.is_none() && intent_def.is_none() {
            tracing::debug!("No definition found for {}", action.identifier);
        }

        let mut namer = ParameterNamer::new(&action.identifier, self.policy);
        let mut key_specs = HashMap::new();

        for (key, value) in &action.parameters {
            let references = find_references(value);
            if references.is_empty() {
                continue;
            }

            let param_def = action_def.and_then(|d| d.parameter(key));
            let intent_param = intent_def.and_then(|d| d.parameter(key));
            let spec = ParameterSpec {
                required: parameter_required(param_def, intent_param),
                description: parameter_description(key, param_def, intent_param),
                scalar_type: ScalarType::String,
            };

            namer.add_key(key, &references)?;
            key_specs.insert(key.as_str(), spec);
        }

        // names are final only once every key is in
        let parameters: BTreeMap<String, ParameterSpec> = namer
            .sources()
            .filter_map(|(name, key)| Some((name.to_string(), key_specs.get(key)?.clone())))
            .collect();

        let definition = ToolDefinition {
            name: action.identifier.clone(),
            description: action_description(&action.identifier, action_def, intent_def),
            parameters,
            response_type: ScalarType::String,
        };
        tracing::debug!(
            "Generated spec for {} with {} parameters",
            definition.name,
            definition.parameters.len()
        );

        Ok(ToolSpec::new(
            definition,
            ShortcutToolMetadata {
                template: action.clone(),
                parameter_id_to_template_path: namer.finish(),
            },
        ))
    }
}

/// Tool description: the best available summary, plus the declared output.
pub fn action_description(
    identifier: &str,
    action_def: Option<&ActionDefinition>,
    intent_def: Option<&IntentActionDefinition>,
) -> String {
    let summary = action_def
        .and_then(|d| d.description.as_ref())
        .and_then(|d| {
            non_empty(d.summary.as_deref()).or_else(|| non_empty(d.note.as_deref()))
        })
        .or_else(|| intent_def.and_then(|d| non_empty(d.description())))
        .or_else(|| intent_def.and_then(|d| non_empty(Some(d.title.key.as_str()))))
        .unwrap_or(identifier);

    match action_def.and_then(|d| d.output.as_ref()) {
        Some(output) => format!(
            "{}\nReturns {} ({})",
            summary,
            output.name.as_deref().unwrap_or("output"),
            output.types.as_deref().unwrap_or_default().join(", ")
        ),
        None => summary.to_string(),
    }
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.is_empty())
}

/// Parameter description: declared class, then description, label, intent title or key.
pub fn parameter_description(
    key: &str,
    param_def: Option<&ParameterDefinition>,
    intent_param: Option<&IntentParameterDefinition>,
) -> String {
    let text = param_def
        .and_then(|d| d.description.as_deref().or(d.label.as_deref()))
        .or_else(|| intent_param.map(|p| p.title.key.as_str()))
        .unwrap_or(key);

    match param_def.and_then(|d| d.class.as_deref()) {
        Some(class) => format!("({}) {}", class, text),
        None => text.to_string(),
    }
}

/// Intent parameters say whether they are optional; otherwise a parameter is
/// required unless its definition carries a default value. Any declared
/// value counts, `false` and `0` included.
pub fn parameter_required(
    param_def: Option<&ParameterDefinition>,
    intent_param: Option<&IntentParameterDefinition>,
) -> bool {
    match intent_param {
        Some(p) => !p.is_optional,
        None => param_def.map_or(true, |d| d.default_value.is_none()),
    }
}
