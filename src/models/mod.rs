pub mod action;
pub mod tool;

pub use action::{Action, Workflow};
pub use tool::{
    ParameterSpec, ScalarType, ShortcutToolMetadata, TaggedToolSpec, ToolDefinition,
    ToolDefinitionOverride, ToolSpec,
};
