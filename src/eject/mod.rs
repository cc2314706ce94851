//! @acp:module "Eject"
//! @acp:summary "One-way materialization of bundled config and scripts into a project"
//! @acp:domain cli
//! @acp:layer service
//!
//! Ejection runs as a fixed sequence of independently reported steps:
//!
//! 1. copy the bundled `config/` directory into the project (overwriting)
//! 2. create the project's `scripts/` directory
//! 3. copy every ejectable bundled script into it
//! 4. rewrite `package.json` (scripts, dependencies, resolutions)
//! 5. drop the tool from `package-lock.json`, if there is one
//!
//! A failing step is logged and recorded, and the remaining steps still run.
//! Nothing is rolled back: an interrupted or partially failed ejection leaves
//! the project as-is for the user to inspect. Running it again overwrites.

pub mod bundle;
pub mod rewrite;

pub use bundle::{ToolBundle, DEFAULT_TOOL_NAME, NON_EJECTABLE_SCRIPTS};
pub use rewrite::{rewrite_lockfile, rewrite_manifest, ManifestChanges, ScriptRewriter};

use std::fmt;
use std::path::{Path, PathBuf};

use dialoguer::{theme::ColorfulTheme, Confirm};
use rayon::prelude::*;
use similar::TextDiff;
use walkdir::WalkDir;

use crate::error::{Result, ScriptsError};
use crate::manifest::{Lockfile, ManifestFile, MANIFEST_FILE};

/// Question asked before anything is touched
pub const CONFIRM_PROMPT: &str = "Are you sure you want to eject? This action is permanent.";

/// @acp:summary "Gate in front of the irreversible part of ejection"
pub trait Confirmation {
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Asks on the terminal, defaulting to "no"
#[derive(Debug, Default, Clone, Copy)]
pub struct InteractivePrompt;

impl Confirmation for InteractivePrompt {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        Ok(Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()?)
    }
}

/// Answers yes without asking (`--yes`)
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirmation for AssumeYes {
    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// The ejection steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EjectStep {
    CopyConfig,
    CreateScriptsDir,
    CopyScripts,
    RewriteManifest,
    RewriteLockfile,
}

impl fmt::Display for EjectStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EjectStep::CopyConfig => "copy config/",
            EjectStep::CreateScriptsDir => "create scripts/",
            EjectStep::CopyScripts => "copy scripts",
            EjectStep::RewriteManifest => "rewrite package.json",
            EjectStep::RewriteLockfile => "rewrite package-lock.json",
        };
        f.write_str(label)
    }
}

/// Outcome of a single step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Done(String),
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: EjectStep,
    pub status: StepStatus,
}

/// @acp:summary "Per-step record of an ejection"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EjectReport {
    pub steps: Vec<StepReport>,
    /// Manifest edits, when the rewrite step succeeded
    pub manifest_changes: Option<ManifestChanges>,
}

impl EjectReport {
    pub fn failures(&self) -> Vec<&StepReport> {
        self.steps
            .iter()
            .filter(|s| matches!(s.status, StepStatus::Failed(_)))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures().is_empty()
    }

    pub fn status(&self, step: EjectStep) -> Option<&StepStatus> {
        self.steps.iter().find(|s| s.step == step).map(|s| &s.status)
    }

    fn record(&mut self, step: EjectStep, result: Result<StepStatus>) {
        let status = match result {
            Ok(status) => {
                tracing::info!(%step, ?status, "eject step finished");
                status
            }
            Err(err) => {
                tracing::error!(%step, error = %err, "eject step failed");
                StepStatus::Failed(err.to_string())
            }
        };
        self.steps.push(StepReport { step, status });
    }
}

/// @acp:summary "Copies a tool bundle into projects and detaches them from the tool"
#[derive(Debug, Clone)]
pub struct EjectionEngine {
    bundle: ToolBundle,
}

impl EjectionEngine {
    pub fn new(bundle: ToolBundle) -> Self {
        Self { bundle }
    }

    pub fn bundle(&self) -> &ToolBundle {
        &self.bundle
    }

    /// @acp:summary "Eject `project_root` once the user confirms"
    ///
    /// Declining is `EjectionDeclined`; step failures are not errors and show
    /// up in the returned report instead.
    pub fn eject(&self, project_root: &Path, confirmation: &dyn Confirmation) -> Result<EjectReport> {
        if !confirmation.confirm(CONFIRM_PROMPT)? {
            tracing::info!("ejection declined");
            return Err(ScriptsError::EjectionDeclined);
        }
        Ok(self.run_steps(project_root))
    }

    fn run_steps(&self, project_root: &Path) -> EjectReport {
        let mut report = EjectReport::default();
        let scripts_dir = project_root.join("scripts");

        report.record(EjectStep::CopyConfig, self.copy_config(project_root));
        report.record(EjectStep::CreateScriptsDir, create_dir(&scripts_dir));
        report.record(EjectStep::CopyScripts, self.copy_scripts(&scripts_dir));

        match self.rewrite_project_manifest(project_root) {
            Ok(changes) => {
                let detail = format!(
                    "{} scripts rewritten, {} dev dependencies merged",
                    changes.scripts.len(),
                    changes.added_dev_dependencies.len()
                );
                report.manifest_changes = Some(changes);
                report.record(EjectStep::RewriteManifest, Ok(StepStatus::Done(detail)));
            }
            Err(err) => report.record(EjectStep::RewriteManifest, Err(err)),
        }

        report.record(EjectStep::RewriteLockfile, self.rewrite_project_lockfile(project_root));
        report
    }

    fn copy_config(&self, project_root: &Path) -> Result<StepStatus> {
        let source = self.bundle.config_dir();
        let target = project_root.join("config");
        let copied = copy_tree(&source, &target)?;
        Ok(StepStatus::Done(format!("{} files", copied)))
    }

    fn copy_scripts(&self, scripts_dir: &Path) -> Result<StepStatus> {
        let scripts = self.bundle.ejectable_scripts()?;

        // Destinations are disjoint, so the copies need no coordination
        let failures: Vec<String> = scripts
            .par_iter()
            .filter_map(|source| {
                let name = source.file_name()?;
                std::fs::copy(source, scripts_dir.join(name))
                    .err()
                    .map(|e| format!("{}: {}", source.display(), e))
            })
            .collect();

        if failures.is_empty() {
            Ok(StepStatus::Done(format!("{} scripts", scripts.len())))
        } else {
            Err(ScriptsError::Other(failures.join("; ")))
        }
    }

    fn rewrite_project_manifest(&self, project_root: &Path) -> Result<ManifestChanges> {
        let mut manifest = ManifestFile::load(project_root.join(MANIFEST_FILE))?;
        let changes = rewrite_manifest(&mut manifest, &self.bundle)?;
        manifest.save()?;
        Ok(changes)
    }

    fn rewrite_project_lockfile(&self, project_root: &Path) -> Result<StepStatus> {
        let Some(mut lockfile) = Lockfile::load_optional(project_root)? else {
            return Ok(StepStatus::Skipped("no package-lock.json".to_string()));
        };
        if rewrite_lockfile(&mut lockfile, &self.bundle) {
            lockfile.save()?;
            Ok(StepStatus::Done(format!("removed {}", self.bundle.name())))
        } else {
            Ok(StepStatus::Skipped(format!("{} not locked", self.bundle.name())))
        }
    }

    /// @acp:summary "Unified diff of the package.json eject would write"
    pub fn preview_manifest(&self, project_root: &Path) -> Result<String> {
        let mut manifest = ManifestFile::load(project_root.join(MANIFEST_FILE))?;
        let before = manifest.to_pretty_string()?;
        rewrite_manifest(&mut manifest, &self.bundle)?;
        let after = manifest.to_pretty_string()?;

        Ok(TextDiff::from_lines(&before, &after)
            .unified_diff()
            .header("package.json", "package.json (ejected)")
            .to_string())
    }
}

fn create_dir(dir: &Path) -> Result<StepStatus> {
    if dir.is_dir() {
        return Ok(StepStatus::Skipped("already exists".to_string()));
    }
    std::fs::create_dir_all(dir)?;
    Ok(StepStatus::Done(dir.display().to_string()))
}

/// Mirror `source` into `target`, overwriting files; returns the file count
fn copy_tree(source: &Path, target: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|e| ScriptsError::Other(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| ScriptsError::Other(e.to_string()))?;
        let destination: PathBuf = target.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&destination)?;
        } else {
            std::fs::copy(entry.path(), &destination)?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Decline;

    impl Confirmation for Decline {
        fn confirm(&self, _prompt: &str) -> Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn test_copy_tree_mirrors_nested_files() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src");
        std::fs::create_dir_all(source.join("jest")).unwrap();
        std::fs::write(source.join("paths.js"), "a").unwrap();
        std::fs::write(source.join("jest").join("cssTransform.js"), "b").unwrap();

        let target = temp.path().join("out");
        assert_eq!(copy_tree(&source, &target).unwrap(), 2);
        assert_eq!(
            std::fs::read_to_string(target.join("jest").join("cssTransform.js")).unwrap(),
            "b"
        );
    }

    #[test]
    fn test_create_dir_tolerates_existing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("scripts");
        assert!(matches!(create_dir(&dir).unwrap(), StepStatus::Done(_)));
        assert!(matches!(create_dir(&dir).unwrap(), StepStatus::Skipped(_)));
    }

    #[test]
    fn test_declined_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let tool = temp.path().join("tool");
        std::fs::create_dir_all(tool.join("config")).unwrap();
        std::fs::create_dir_all(tool.join("scripts")).unwrap();
        std::fs::write(tool.join("package.json"), r#"{"name": "solid-scripts"}"#).unwrap();
        let project = temp.path().join("app");
        std::fs::create_dir_all(&project).unwrap();

        let engine = EjectionEngine::new(ToolBundle::open(&tool).unwrap());
        let result = engine.eject(&project, &Decline);

        assert!(matches!(result, Err(ScriptsError::EjectionDeclined)));
        assert!(!project.join("scripts").exists());
        assert!(!project.join("config").exists());
    }

    #[test]
    fn test_report_failures() {
        let mut report = EjectReport::default();
        report.record(EjectStep::CopyConfig, Ok(StepStatus::Done("1 files".to_string())));
        report.record(EjectStep::CopyScripts, Err(ScriptsError::Other("boom".to_string())));

        assert!(!report.is_complete());
        assert_eq!(report.failures().len(), 1);
        assert_eq!(
            report.status(EjectStep::CopyScripts),
            Some(&StepStatus::Failed("boom".to_string()))
        );
    }
}
