//! Unified error type for the toolbox compiler: domain failures and their process exit codes.

use thiserror::Error;

/// Exit codes reported by the CLI.
const EXIT_INTEGRITY: i32 = 70;
const EXIT_DATA: i32 = 65;
const EXIT_USAGE: i32 = 64;
const EXIT_IO: i32 = 74;
const EXIT_INTERNAL: i32 = 1;

#[derive(Error, Debug)]
pub enum ToolboxError {
    /// A reference path did not resolve against the template it was applied to.
    #[error("Template integrity error at {path}: {reason}")]
    TemplateIntegrity { path: String, reason: String },

    #[error("Parameter name collision in tool {tool}: {name}")]
    NamingCollision { tool: String, name: String },

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Missing required parameter {parameter} for tool {tool}")]
    MissingParameter { tool: String, parameter: String },

    #[error("Unknown parameter {parameter} for tool {tool}")]
    UnknownParameter { tool: String, parameter: String },

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl ToolboxError {
    pub fn integrity(path: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        Self::TemplateIntegrity {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Process exit code for this error variant.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::TemplateIntegrity { .. } | Self::NamingCollision { .. } => EXIT_INTEGRITY,
            Self::InvalidTemplate(_) | Self::Json(_) => EXIT_DATA,
            Self::ToolNotFound(_)
            | Self::MissingParameter { .. }
            | Self::UnknownParameter { .. } => EXIT_USAGE,
            Self::Io(_) => EXIT_IO,
            Self::Internal(_) => EXIT_INTERNAL,
        }
    }
}

pub type Result<T, E = ToolboxError> = std::result::Result<T, E>;
