//! @acp:module "Build Command"
//! @acp:summary "Synthesize a production bundler config and run the bundled build script"
//! @acp:domain cli
//! @acp:layer handler

use std::path::PathBuf;

use anyhow::Result;

use crate::config::Settings;
use crate::eject::ToolBundle;
use crate::env::{EnvironmentDescriptor, Mode};
use crate::manifest::ManifestFile;
use crate::overrides::merge_from_manifest;
use crate::paths::PathSet;
use crate::runner::{check_outcome, write_config, Launch, ProcessOutcome};
use crate::webpack::{self, BuildConfig};

/// Options for the build command
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Directory the project root is discovered from
    pub cwd: PathBuf,
    /// Interpreter flags given before the script name
    pub node_args: Vec<String>,
    /// Arguments given after the script name
    pub script_args: Vec<String>,
}

/// Execute the build command
pub fn execute_build(options: BuildOptions, settings: &Settings) -> Result<ProcessOutcome> {
    run_bundler("build", Mode::Production, options, settings)
}

/// @acp:summary "Synthesize, merge overrides and launch one bundler script"
pub(crate) fn run_bundler(
    script: &str,
    mode: Mode,
    options: BuildOptions,
    settings: &Settings,
) -> Result<ProcessOutcome> {
    let paths = PathSet::discover(&options.cwd)?;
    let config = prepare(mode, &paths, settings)?;
    paths.require_entry()?;

    let bundle = ToolBundle::locate(settings)?;
    let config_path = write_config(&paths.cache_dir(), script, &config)?;

    let launch = Launch {
        script: script.to_string(),
        node_args: options.node_args,
        script_args: options.script_args,
        node_env: mode.as_str().to_string(),
        config_path,
        cwd: paths.root.clone(),
    };
    let outcome = launch.run(settings, bundle.root())?;
    Ok(check_outcome(outcome)?)
}

/// @acp:summary "The merged bundler config for a project, without launching anything"
pub fn prepare(mode: Mode, paths: &PathSet, settings: &Settings) -> crate::Result<BuildConfig> {
    let manifest = ManifestFile::load(&paths.manifest)?;
    let env = EnvironmentDescriptor::new(mode, settings, Some(&manifest));
    let base = webpack::synthesize(&env, paths);
    merge_from_manifest(&base, &manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScriptsError;
    use serde_json::json;
    use tempfile::TempDir;

    fn project(manifest: serde_json::Value) -> TempDir {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("package.json"), manifest.to_string()).unwrap();
        temp
    }

    #[test]
    fn test_prepare_applies_build_overrides() {
        let temp = project(json!({
            "name": "app",
            "solidScripts": {"externals": {"jquery": "jQuery"}}
        }));
        let paths = PathSet::for_root(temp.path());
        let config = prepare(Mode::Production, &paths, &Settings::default()).unwrap();

        assert_eq!(config.externals.unwrap()["jquery"], "jQuery");
        assert!(config.optimization.minimize);
    }

    #[test]
    fn test_prepare_rejects_unknown_build_keys() {
        let temp = project(json!({"solidScripts": {"module": {}, "entry": "x.js"}}));
        let paths = PathSet::for_root(temp.path());
        let err = prepare(Mode::Development, &paths, &Settings::default()).unwrap_err();

        match err {
            ScriptsError::UnsupportedOverride(rejected) => {
                assert_eq!(rejected.keys, vec!["entry", "module"])
            }
            other => panic!("expected UnsupportedOverride, got {:?}", other),
        }
    }
}
