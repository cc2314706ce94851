//! @acp:module "Tool Bundle"
//! @acp:summary "Locates the solid-scripts installation and its bundled defaults"
//! @acp:domain cli
//! @acp:layer io
//!
//! This is the one place that reads from the tool's own installation rather
//! than the project: ejection copies from here, and the runner launches the
//! bundled scripts from here.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::config::Settings;
use crate::error::{Result, ScriptsError};
use crate::manifest::{ManifestFile, MANIFEST_FILE};

/// Package name used when the bundle manifest does not declare one
pub const DEFAULT_TOOL_NAME: &str = "solid-scripts";

/// Scripts that only make sense inside the tool and are never ejected
pub const NON_EJECTABLE_SCRIPTS: &[&str] = &["index", "init", "eject"];

/// @acp:summary "An installed copy of solid-scripts"
#[derive(Debug, Clone)]
pub struct ToolBundle {
    root: PathBuf,
    manifest: ManifestFile,
}

impl ToolBundle {
    /// @acp:summary "Open the bundle rooted at `root`"
    pub fn open<P: Into<PathBuf>>(root: P) -> Result<Self> {
        let root = root.into();
        let manifest = ManifestFile::load(root.join(MANIFEST_FILE))?;
        Ok(Self { root, manifest })
    }

    /// @acp:summary "Find the installation from settings or the running executable"
    pub fn locate(settings: &Settings) -> Result<Self> {
        if let Some(root) = &settings.bundle_root {
            return Self::open(root);
        }

        let exe = std::env::current_exe()?;
        let found = exe
            .ancestors()
            .skip(1)
            .find(|dir| is_bundle_root(dir))
            .map(Path::to_path_buf);

        match found {
            Some(root) => Self::open(root),
            None => Err(ScriptsError::BundleNotFound),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.root.join("scripts")
    }

    pub fn name(&self) -> &str {
        self.manifest.name().unwrap_or(DEFAULT_TOOL_NAME)
    }

    pub fn version(&self) -> Option<&str> {
        self.manifest.version()
    }

    /// Runtime dependencies the bundled scripts need
    pub fn dependencies(&self) -> Map<String, Value> {
        self.manifest.dependencies().cloned().unwrap_or_default()
    }

    /// Pinned resolution table, copied verbatim on eject
    pub fn resolutions(&self) -> Option<&Map<String, Value>> {
        self.manifest.resolutions()
    }

    /// Bundled scripts that belong in an ejected project
    pub fn ejectable_scripts(&self) -> Result<Vec<PathBuf>> {
        let mut scripts = Vec::new();
        for entry in std::fs::read_dir(self.scripts_dir())? {
            let path = entry?.path();
            if path.is_file() && is_ejectable(&path) {
                scripts.push(path);
            }
        }
        scripts.sort();
        Ok(scripts)
    }
}

fn is_bundle_root(dir: &Path) -> bool {
    dir.join(MANIFEST_FILE).is_file() && dir.join("config").is_dir() && dir.join("scripts").is_dir()
}

fn is_ejectable(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| !NON_EJECTABLE_SCRIPTS.contains(&stem))
}
