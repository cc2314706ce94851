//! @acp:module "Test Command"
//! @acp:summary "Synthesize the test-runner config and run the bundled test script"
//! @acp:domain cli
//! @acp:layer handler

use std::path::PathBuf;

use anyhow::Result;

use crate::config::Settings;
use crate::eject::ToolBundle;
use crate::jest::{self, TestConfig};
use crate::manifest::ManifestFile;
use crate::overrides::merge_from_manifest;
use crate::paths::PathSet;
use crate::runner::{check_outcome, write_config, Launch, ProcessOutcome};

/// Options for the test command
#[derive(Debug, Clone)]
pub struct TestOptions {
    /// Directory the project root is discovered from
    pub cwd: PathBuf,
    /// Interpreter flags given before the script name
    pub node_args: Vec<String>,
    /// Arguments forwarded to the test runner
    pub script_args: Vec<String>,
}

/// Execute the test command
pub fn execute_test(options: TestOptions, settings: &Settings) -> Result<ProcessOutcome> {
    let paths = PathSet::discover(&options.cwd)?;
    let bundle = ToolBundle::locate(settings)?;
    let config = prepare(&paths)?.with_tool_root(bundle.root());
    let config_path = write_config(&paths.cache_dir(), "test", &config)?;

    let launch = Launch {
        script: "test".to_string(),
        node_args: options.node_args,
        script_args: runner_args(options.script_args, settings.ci),
        node_env: "test".to_string(),
        config_path,
        cwd: paths.root.clone(),
    };
    let outcome = launch.run(settings, bundle.root())?;
    Ok(check_outcome(outcome)?)
}

/// @acp:summary "The merged test-runner config for a project"
pub fn prepare(paths: &PathSet) -> crate::Result<TestConfig> {
    let manifest = ManifestFile::load(&paths.manifest)?;
    let base = jest::synthesize(paths);
    merge_from_manifest(&base, &manifest)
}

/// Interactive runs watch by default; CI and coverage runs do not
pub fn runner_args(mut args: Vec<String>, ci: bool) -> Vec<String> {
    let opted_out = args.iter().any(|arg| {
        arg == "--coverage" || arg == "--watch" || arg == "--watchAll" || arg.starts_with("--watchAll=")
    });
    if !ci && !opted_out {
        args.push("--watch".to_string());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_watch_is_default_outside_ci() {
        assert_eq!(runner_args(args(&["--silent"]), false), args(&["--silent", "--watch"]));
        assert_eq!(runner_args(args(&["--silent"]), true), args(&["--silent"]));
    }

    #[test]
    fn test_watch_skipped_for_coverage_and_watch_all() {
        assert_eq!(runner_args(args(&["--coverage"]), false), args(&["--coverage"]));
        assert_eq!(runner_args(args(&["--watchAll=false"]), false), args(&["--watchAll=false"]));
        assert_eq!(runner_args(args(&["--watch"]), false), args(&["--watch"]));
    }

    #[test]
    fn test_prepare_merges_jest_block() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("package.json"),
            json!({"jest": {"resetModules": true}}).to_string(),
        )
        .unwrap();

        let config = prepare(&PathSet::for_root(temp.path())).unwrap();
        assert_eq!(config.reset_modules, Some(true));
        assert!(config.setup_files_after_env.is_empty());
    }
}
