use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::template::CollisionPolicy;

pub const CONFIG_DIR: &str = ".toolbox";
pub const CONFIG_FILE: &str = "config.toml";

/// toolbox configuration from .toolbox/config.toml
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct ToolboxConfig {
    #[serde(default)]
    pub compiler: CompilerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CompilerConfig {
    /// Discriminator written on every emitted spec.
    #[serde(default = "default_tool_type")]
    pub tool_type: String,
    #[serde(default)]
    pub collision_policy: CollisionPolicy,
    #[serde(default = "default_skip_logical_actions")]
    pub skip_logical_actions: bool,
}

fn default_tool_type() -> String {
    "shortcut".to_string()
}

fn default_skip_logical_actions() -> bool {
    true
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            tool_type: default_tool_type(),
            collision_policy: CollisionPolicy::default(),
            skip_logical_actions: default_skip_logical_actions(),
        }
    }
}

/// Lookup tables and overrides. Relative paths resolve against the working directory.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct CatalogConfig {
    #[serde(default)]
    pub actions_path: Option<PathBuf>,
    #[serde(default)]
    pub intents_path: Option<PathBuf>,
    #[serde(default)]
    pub overrides_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join("catalog.json")
}

fn default_pretty() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            pretty: default_pretty(),
        }
    }
}

/// Directory holding the effective config: the project's `.toolbox` when it
/// has a config file, else the per-user `toolbox` config directory when that
/// has one, else the project's `.toolbox`.
pub fn config_dir(project_root: &Path) -> PathBuf {
    let project = project_root.join(CONFIG_DIR);
    if project.join(CONFIG_FILE).exists() {
        return project;
    }
    if let Some(user) = dirs::config_dir().map(|d| d.join("toolbox")) {
        if user.join(CONFIG_FILE).exists() {
            return user;
        }
    }
    project
}

/// Load configuration from `<dir>/config.toml`, falling back to defaults.
pub fn load_config(toolbox_dir: &Path) -> ToolboxConfig {
    let config_path = toolbox_dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return ToolboxConfig::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse {}: {}", config_path.display(), e);
            ToolboxConfig::default()
        }),
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", config_path.display(), e);
            ToolboxConfig::default()
        }
    }
}

pub const DEFAULT_CONFIG: &str = r#"# toolbox configuration
# See: toolbox config --help

[compiler]
tool_type = "shortcut"
# "fallback" names ambiguous parameters by their full path, "fail" aborts
collision_policy = "fallback"
skip_logical_actions = true

[catalog]
# actions_path = "WFActions.json"
# intents_path = "intents.json"
# overrides_path = "overrides.json"

[output]
catalog_path = ".toolbox/catalog.json"
pretty = true
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path());
        assert_eq!(config, ToolboxConfig::default());
        assert_eq!(config.compiler.tool_type, "shortcut");
        assert!(config.compiler.skip_logical_actions);
    }

    #[test]
    fn test_default_config_text_matches_defaults() {
        let parsed: ToolboxConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(parsed, ToolboxConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[compiler]\ncollision_policy = \"fail\"\n\n[catalog]\nactions_path = \"a.json\"\n",
        )
        .unwrap();

        let config = load_config(dir.path());
        assert_eq!(config.compiler.collision_policy, CollisionPolicy::Fail);
        assert_eq!(config.compiler.tool_type, "shortcut");
        assert_eq!(config.catalog.actions_path, Some(PathBuf::from("a.json")));
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn test_project_config_dir_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(CONFIG_DIR)).unwrap();
        std::fs::write(dir.path().join(CONFIG_DIR).join(CONFIG_FILE), DEFAULT_CONFIG).unwrap();
        assert_eq!(config_dir(dir.path()), dir.path().join(CONFIG_DIR));
    }

    #[test]
    fn test_unparseable_config_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[compiler\n").unwrap();
        assert_eq!(load_config(dir.path()), ToolboxConfig::default());
    }
}
