//! Loading workflow templates and override files from disk.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::{DirEntry, WalkDir};

use super::repository::ToolRepository;
use super::spec::GenerateSpec;
use crate::error::{Result, ToolboxError};
use crate::models::{Action, ToolDefinitionOverride, Workflow};
use crate::template::logical::is_logical_identifier;

/// One entry of an override file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub action: Action,
    #[serde(rename = "override")]
    pub overrides: ToolDefinitionOverride,
}

/// Counters for one scanning pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub files: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub skipped: usize,
}

fn is_visible(entry: &DirEntry) -> bool {
    entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

/// Workflow files under `roots`: files are taken as given, directories are
/// walked for `*.json`, skipping hidden entries. Sorted within each root.
pub fn workflow_files(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for root in roots {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        if !root.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("template path not found: {}", root.display()),
            )
            .into());
        }

        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(is_visible)
        {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_file() && is_json(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

pub fn read_workflow(path: &Path) -> Result<Workflow> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| ToolboxError::InvalidTemplate(format!("{}: {}", path.display(), e)))
}

pub fn read_overrides(path: &Path) -> Result<Vec<OverrideEntry>> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| ToolboxError::InvalidTemplate(format!("{}: {}", path.display(), e)))
}

/// Register every override in `entries`. Call before adding templates.
/// Entries that set no field are skipped. Returns the number registered.
pub fn register_overrides<G>(
    repository: &mut ToolRepository<Action, G>,
    entries: Vec<OverrideEntry>,
) -> Result<usize>
where
    G: GenerateSpec<Action>,
    G::Metadata: Serialize + Clone + PartialEq,
{
    let mut count = 0;
    for entry in entries {
        if entry.overrides.is_empty() {
            tracing::debug!("Skipping empty override for {}", entry.action.identifier);
            continue;
        }
        repository.add_override_for(&entry.action, entry.overrides)?;
        count += 1;
    }
    Ok(count)
}

/// Add the actions of one workflow to the repository.
pub fn add_workflow<G>(
    repository: &mut ToolRepository<Action, G>,
    workflow: Workflow,
    skip_logical: bool,
    stats: &mut ScanStats,
) -> Result<()>
where
    G: GenerateSpec<Action>,
    G::Metadata: Serialize + Clone + PartialEq,
{
    for action in workflow.actions {
        if skip_logical && is_logical_identifier(&action.identifier) {
            stats.skipped += 1;
            continue;
        }
        if repository.add(action)? {
            stats.inserted += 1;
        } else {
            stats.duplicates += 1;
        }
    }
    Ok(())
}

/// Read every workflow file under `roots` into the repository.
pub fn scan<G>(
    repository: &mut ToolRepository<Action, G>,
    roots: &[PathBuf],
    skip_logical: bool,
) -> Result<ScanStats>
where
    G: GenerateSpec<Action>,
    G::Metadata: Serialize + Clone + PartialEq,
{
    let mut stats = ScanStats::default();
    for path in workflow_files(roots)? {
        tracing::debug!("Scanning {}", path.display());
        let workflow = read_workflow(&path)?;
        add_workflow(repository, workflow, skip_logical, &mut stats)?;
        stats.files += 1;
    }

    tracing::info!(
        "Scanned {} files: {} tools added, {} duplicates, {} scaffolding actions skipped",
        stats.files,
        stats.inserted,
        stats.duplicates,
        stats.skipped
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::compiler::spec::ShortcutSpecGenerator;
    use crate::template::CollisionPolicy;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    type Repo = ToolRepository<Action, ShortcutSpecGenerator<StaticCatalog, StaticCatalog>>;

    fn repository() -> Repo {
        ToolRepository::new(
            "shortcut",
            ShortcutSpecGenerator::new(StaticCatalog::new(), StaticCatalog::new(), CollisionPolicy::Fallback),
        )
    }

    fn text_action() -> serde_json::Value {
        json!({
            "WFWorkflowActionIdentifier": "is.workflow.actions.gettext",
            "WFWorkflowActionParameters": {
                "WFTextActionText": { "Type": "Variable", "VariableName": "var" }
            }
        })
    }

    fn write_workflow(dir: &Path, name: &str, actions: serde_json::Value) {
        let workflow = json!({ "WFWorkflowActions": actions });
        std::fs::write(dir.join(name), workflow.to_string()).unwrap();
    }

    #[test]
    fn test_scan_dedups_and_skips_scaffolding() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::create_dir(dir.path().join(".hidden")).unwrap();

        write_workflow(
            dir.path(),
            "a.json",
            json!([
                text_action(),
                { "WFWorkflowActionIdentifier": "is.workflow.actions.exit" }
            ]),
        );
        write_workflow(&nested, "b.json", json!([text_action()]));
        write_workflow(&dir.path().join(".hidden"), "c.json", json!([{
            "WFWorkflowActionIdentifier": "is.workflow.actions.other",
            "WFWorkflowActionParameters": {}
        }]));
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut repo = repository();
        let stats = scan(&mut repo, &[dir.path().to_path_buf()], true).unwrap();
        assert_eq!(
            stats,
            ScanStats {
                files: 2,
                inserted: 1,
                duplicates: 1,
                skipped: 1,
            }
        );
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_invalid_workflow_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ \"WFWorkflowActions\": 3 }").unwrap();

        let err = read_workflow(&path).unwrap_err();
        assert!(matches!(err, ToolboxError::InvalidTemplate(ref msg) if msg.contains("bad.json")));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = workflow_files(&[dir.path().join("absent")]).unwrap_err();
        assert!(matches!(err, ToolboxError::Io(_)));
    }

    #[test]
    fn test_overrides_apply_to_scanned_templates() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = dir.path().join("overrides.json");
        std::fs::write(
            &overrides,
            json!([{
                "action": text_action(),
                "override": { "name": "get_text", "description": "Returns the given text" }
            }])
            .to_string(),
        )
        .unwrap();
        let workflow_path = dir.path().join("w.json");
        write_workflow(dir.path(), "w.json", json!([text_action()]));

        let mut repo = repository();
        let entries = read_overrides(&overrides).unwrap();
        assert_eq!(register_overrides(&mut repo, entries).unwrap(), 1);
        scan(&mut repo, &[workflow_path], true).unwrap();

        let catalog = repo.into_catalog();
        let spec = &catalog.find("get_text").unwrap().spec;
        assert_eq!(spec.effective_definition().description, "Returns the given text");
    }

    #[test]
    fn test_empty_overrides_are_not_registered() {
        let mut repo = repository();
        let entries: Vec<OverrideEntry> = serde_json::from_value(json!([
            { "action": text_action(), "override": {} },
            { "action": text_action(), "override": { "name": "get_text" } }
        ]))
        .unwrap();
        assert_eq!(register_overrides(&mut repo, entries).unwrap(), 1);

        repo.add(serde_json::from_value(text_action()).unwrap()).unwrap();
        assert_eq!(repo.list()[0].spec.effective_name(), "get_text");
    }
}
