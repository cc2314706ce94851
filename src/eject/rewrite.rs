//! @acp:module "Manifest Rewrite"
//! @acp:summary "In-memory package.json and lockfile edits performed by eject"
//! @acp:domain cli
//! @acp:layer service

use regex::Regex;
use serde_json::Value;

use super::bundle::ToolBundle;
use crate::error::{Result, ScriptsError};
use crate::manifest::{Lockfile, ManifestFile};

/// Subcommands whose script entries point at the tool
pub const REWRITTEN_SCRIPTS: &[&str] = &["build", "start", "test"];

/// What a manifest rewrite changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestChanges {
    /// Script entries now pointing at local copies
    pub scripts: Vec<String>,
    /// Whether the tool's own dependency entry was removed
    pub removed_tool: bool,
    /// Dependencies added to (or overwritten in) devDependencies
    pub added_dev_dependencies: Vec<String>,
    /// Whether a resolution table was written
    pub resolutions: bool,
}

/// @acp:summary "Points tool invocations at the ejected scripts"
///
/// `solid-scripts test --watch` becomes `node scripts/test.js --watch`;
/// commands that do not invoke the tool are left alone.
#[derive(Debug, Clone)]
pub struct ScriptRewriter {
    invocation: Regex,
}

impl ScriptRewriter {
    pub fn new(tool_name: &str) -> Result<Self> {
        let pattern = format!(
            r"(^|[\s;&|(]){}\s+({})([\s;&|)]|$)",
            regex::escape(tool_name),
            REWRITTEN_SCRIPTS.join("|")
        );
        let invocation = Regex::new(&pattern).map_err(|e| ScriptsError::Other(e.to_string()))?;
        Ok(Self { invocation })
    }

    /// The rewritten command, or `None` when `command` does not invoke the tool
    pub fn rewrite(&self, command: &str) -> Option<String> {
        if !self.invocation.is_match(command) {
            return None;
        }
        Some(
            self.invocation
                .replace_all(command, "${1}node scripts/${2}.js${3}")
                .into_owned(),
        )
    }
}

/// @acp:summary "Apply every eject edit to a project manifest"
pub fn rewrite_manifest(manifest: &mut ManifestFile, tool: &ToolBundle) -> Result<ManifestChanges> {
    let mut changes = ManifestChanges::default();
    let tool_name = tool.name().to_string();

    let rewriter = ScriptRewriter::new(&tool_name)?;
    if manifest.scripts().is_some() {
        for (name, command) in manifest.object_mut("scripts").iter_mut() {
            let Some(rewritten) = command.as_str().and_then(|text| rewriter.rewrite(text)) else {
                continue;
            };
            *command = Value::String(rewritten);
            changes.scripts.push(name.clone());
        }
    }

    for table in ["dependencies", "devDependencies"] {
        if manifest.as_map().get(table).is_some_and(Value::is_object) {
            changes.removed_tool |= manifest.object_mut(table).shift_remove(&tool_name).is_some();
        }
    }

    // Tool dependencies win over the project's own pins
    let dev = manifest.object_mut("devDependencies");
    for (name, version) in tool.dependencies() {
        dev.insert(name.clone(), version);
        changes.added_dev_dependencies.push(name);
    }

    match tool.resolutions() {
        Some(resolutions) => {
            manifest.set("resolutions", Value::Object(resolutions.clone()));
            changes.resolutions = true;
        }
        None => {
            manifest.remove("resolutions");
        }
    }

    Ok(changes)
}

/// Remove the tool from a lockfile; returns whether an entry existed
pub fn rewrite_lockfile(lockfile: &mut Lockfile, tool: &ToolBundle) -> bool {
    lockfile.remove_package(tool.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_command() {
        let rewriter = ScriptRewriter::new("solid-scripts").unwrap();
        let rewrite = |cmd: &str| rewriter.rewrite(cmd);

        assert_eq!(rewrite("solid-scripts build"), Some("node scripts/build.js".to_string()));
        assert_eq!(
            rewrite("solid-scripts test --watchAll=false"),
            Some("node scripts/test.js --watchAll=false".to_string())
        );
        assert_eq!(
            rewrite("cross-env FOO=1 solid-scripts start"),
            Some("cross-env FOO=1 node scripts/start.js".to_string())
        );
        assert_eq!(rewrite("eslint src"), None);
        assert_eq!(rewrite("solid-scripts eject"), None);
        assert_eq!(rewrite("my-solid-scripts build"), None);
    }

    #[test]
    fn test_subcommand_must_end_at_a_word_boundary() {
        let rewriter = ScriptRewriter::new("solid-scripts").unwrap();
        let rewrite = |cmd: &str| rewriter.rewrite(cmd);

        assert_eq!(rewrite("solid-scripts build-storybook"), None);
        assert_eq!(rewrite("solid-scripts test:ci --coverage"), None);
        assert_eq!(rewrite("solid-scripts start.dev"), None);
        assert_eq!(
            rewrite("solid-scripts build && solid-scripts test"),
            Some("node scripts/build.js && node scripts/test.js".to_string())
        );
        assert_eq!(
            rewrite("solid-scripts test;echo done"),
            Some("node scripts/test.js;echo done".to_string())
        );
    }

    #[test]
    fn test_tool_name_is_escaped() {
        let rewriter = ScriptRewriter::new("@scope/tool.x").unwrap();
        assert_eq!(
            rewriter.rewrite("@scope/tool.x build"),
            Some("node scripts/build.js".to_string())
        );
        assert_eq!(rewriter.rewrite("@scope/toolax build"), None);
    }
}
