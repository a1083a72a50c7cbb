//! Assembly of the single runner workflow that dispatches on a tool name.
//!
//! The runner reads `{ "tool": ..., "params": { ... } }` as its input. Each
//! tool gets one conditional branch that copies its parameters into named
//! variables, runs the filled template and outputs the base64 encoded result.

use serde_json::Value;

use super::export::ToolCatalog;
use crate::error::Result;
use crate::models::{Action, ShortcutToolMetadata, Workflow};
use crate::template::apply_at;
use crate::template::ids::IdGenerator;
use crate::template::logical::LogicalAction;

pub const TOOL_KEY: &str = "tool";
pub const PARAMS_KEY: &str = "params";

/// Name of the variable that carries `parameter` of `tool` inside the runner.
pub fn variable_name(tool: &str, parameter: &str) -> String {
    format!("{}:{}", tool, parameter)
}

pub fn build_dispatch_workflow(
    catalog: &ToolCatalog<ShortcutToolMetadata>,
    ids: &mut dyn IdGenerator,
) -> Result<Workflow> {
    let mut actions: Vec<Action> = Vec::new();

    let input = LogicalAction::dictionary_input(ids);
    let input_id = output_id(&input);
    let tool = LogicalAction::get_value_for_key(ids, input_id.clone(), None, TOOL_KEY);
    let tool_id = output_id(&tool);
    actions.push(LogicalAction::comment(format!("Dispatches {} tools", catalog.len())).into());
    actions.push(input.into());
    actions.push(tool.into());

    for tagged in catalog.specs() {
        let name = tagged.spec.effective_name();
        let metadata = &tagged.spec.metadata;

        let branch = LogicalAction::if_output_equals(ids, tool_id.clone(), name);
        let grouping_id = branch.grouping_id().unwrap_or_default().to_string();
        actions.push(branch.into());

        let mut root = metadata.template.parameters_node();
        for (parameter, path) in &metadata.parameter_id_to_template_path {
            let get = LogicalAction::get_value_for_key(
                ids,
                input_id.clone(),
                Some(PARAMS_KEY.to_string()),
                parameter.clone(),
            );
            let variable = variable_name(name, parameter);
            let set = LogicalAction::set_variable(output_id(&get), variable.clone());
            actions.push(get.into());
            actions.push(set.into());
            root = apply_at(&root, path, &Value::String(variable))?;
        }

        let instance_id = ids.next_id();
        if let Value::Object(map) = &mut root {
            map.insert("UUID".to_string(), Value::String(instance_id.clone()));
        }
        actions.push(Action::new(metadata.template.identifier.clone(), root));

        let encode = LogicalAction::base64_encode(ids, instance_id);
        let encoded_id = output_id(&encode);
        actions.push(encode.into());
        actions.push(LogicalAction::output_and_exit(encoded_id).into());
        actions.push(LogicalAction::end_if(ids, grouping_id).into());
        tracing::debug!("Added dispatch branch for {}", name);
    }

    actions.push(LogicalAction::Exit.into());
    tracing::info!(
        "Built dispatch workflow with {} actions for {} tools",
        actions.len(),
        catalog.len()
    );
    Ok(Workflow::new(actions))
}

fn output_id(action: &LogicalAction) -> String {
    action.output_id().unwrap_or_default().to_string()
}
