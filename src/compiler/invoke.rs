//! Invocation: filling a stored template from a flat parameter map.

use serde_json::{Map, Value};

use super::export::ToolCatalog;
use crate::error::{Result, ToolboxError};
use crate::models::{Action, ShortcutToolMetadata, ToolSpec};
use crate::template::apply::apply_all;

/// Build the concrete action for one call of the tool described by `spec`.
///
/// Every supplied parameter must be a known parameter name. Required
/// parameters must be supplied; an omitted optional one keeps its
/// placeholder.
pub fn instantiate(spec: &ToolSpec<ShortcutToolMetadata>, params: &Map<String, Value>) -> Result<Action> {
    let tool = spec.effective_name();
    let paths = &spec.metadata.parameter_id_to_template_path;

    if let Some(unknown) = params.keys().find(|name| !paths.contains_key(*name)) {
        return Err(ToolboxError::UnknownParameter {
            tool: tool.to_string(),
            parameter: unknown.clone(),
        });
    }

    let mut substitutions = Vec::with_capacity(params.len());
    for (name, path) in paths {
        match params.get(name) {
            Some(value) => substitutions.push((path, value)),
            None if is_required(spec, name) => {
                return Err(ToolboxError::MissingParameter {
                    tool: tool.to_string(),
                    parameter: name.clone(),
                });
            }
            None => tracing::debug!("{}: leaving optional parameter {} unset", tool, name),
        }
    }

    let root = apply_all(&spec.metadata.template.parameters_node(), substitutions)?;
    Ok(Action::new(spec.metadata.template.identifier.clone(), root))
}

fn is_required(spec: &ToolSpec<ShortcutToolMetadata>, name: &str) -> bool {
    spec.definition
        .parameters
        .get(name)
        .map_or(true, |p| p.required)
}

/// Look up `name` in the catalog and instantiate it.
pub fn invoke(
    catalog: &ToolCatalog<ShortcutToolMetadata>,
    name: &str,
    params: &Map<String, Value>,
) -> Result<Action> {
    let tagged = catalog.get(name)?;
    instantiate(&tagged.spec, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::compiler::spec::{GenerateSpec, ShortcutSpecGenerator};
    use crate::models::{ParameterSpec, ScalarType, TaggedToolSpec, ToolDefinitionOverride};
    use crate::template::{find_references, CollisionPolicy};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn variable() -> Value {
        json!({ "Type": "Variable", "VariableName": "var" })
    }

    fn list_spec() -> ToolSpec<ShortcutToolMetadata> {
        let action = Action::new(
            "is.workflow.actions.list",
            json!({
                "WFItems": [{ "v": variable() }, { "v": variable() }],
                "WFTitle": variable(),
                "UUID": "LIST-1"
            }),
        );
        ShortcutSpecGenerator::new(StaticCatalog::new(), StaticCatalog::new(), CollisionPolicy::Fallback)
            .generate(&action)
            .unwrap()
    }

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_instantiate_fills_every_reference() {
        let spec = list_spec();
        let action = instantiate(&spec, &params(json!({ "0": "a", "1": "b", "WFTitle": "t" }))).unwrap();

        assert_eq!(action.identifier, "is.workflow.actions.list");
        assert_eq!(action.parameters["WFItems"][0]["v"]["VariableName"], "a");
        assert_eq!(action.parameters["WFItems"][1]["v"]["VariableName"], "b");
        assert_eq!(action.parameters["WFTitle"]["VariableName"], "t");
        assert_eq!(action.parameters["WFTitle"]["Type"], "Variable");
        assert_eq!(action.parameters["UUID"], "LIST-1");

        // the stored template is untouched
        assert_eq!(spec.metadata.template.parameters["WFTitle"], variable());
    }

    #[test]
    fn test_markers_leave_no_references_at_mapped_paths() {
        let spec = list_spec();
        let filled = instantiate(
            &spec,
            &params(json!({ "0": { "m": 0 }, "1": { "m": 1 }, "WFTitle": { "m": 2 } })),
        )
        .unwrap();
        let remaining = find_references(&filled.parameters_node());
        for path in spec.metadata.parameter_id_to_template_path.values() {
            assert!(!remaining.contains(path));
        }
    }

    #[test]
    fn test_missing_and_unknown_parameters() {
        let mut spec = list_spec();
        let err = instantiate(&spec, &params(json!({ "0": "a", "1": "b" }))).unwrap_err();
        assert!(matches!(
            err,
            ToolboxError::MissingParameter { ref parameter, .. } if parameter == "WFTitle"
        ));

        let err = instantiate(&spec, &params(json!({ "nope": 1 }))).unwrap_err();
        assert!(matches!(err, ToolboxError::UnknownParameter { .. }));

        spec.definition.parameters.insert(
            "WFTitle".into(),
            ParameterSpec {
                required: false,
                description: String::new(),
                scalar_type: ScalarType::String,
            },
        );
        let action = instantiate(&spec, &params(json!({ "0": "a", "1": "b" }))).unwrap();
        assert_eq!(action.parameters["WFTitle"], variable());
    }

    #[test]
    fn test_invoke_by_effective_name() {
        let mut spec = list_spec();
        spec.merge_override(&ToolDefinitionOverride {
            name: Some("make_list".into()),
            ..Default::default()
        });
        let catalog = ToolCatalog::new(vec![TaggedToolSpec {
            tool_type: "shortcut".into(),
            spec,
        }]);

        let args = params(json!({ "0": "a", "1": "b", "WFTitle": "t" }));
        assert!(invoke(&catalog, "make_list", &args).is_ok());
        assert!(matches!(
            invoke(&catalog, "is.workflow.actions.list", &args),
            Err(ToolboxError::ToolNotFound(_))
        ));
    }
}
