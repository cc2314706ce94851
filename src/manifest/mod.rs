//! @acp:module "Manifest"
//! @acp:summary "package.json and package-lock.json documents"
//! @acp:domain cli
//! @acp:layer io
//!
//! Manifests are kept as raw, order-preserving JSON objects so that a rewrite
//! only touches the fields it means to touch. Typed accessors cover the
//! fields solid-scripts reads.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{Result, ScriptsError};

/// File name of the project manifest
pub const MANIFEST_FILE: &str = "package.json";

/// File name of the npm lockfile
pub const LOCKFILE_FILE: &str = "package-lock.json";

/// @acp:summary "A project's package.json"
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestFile {
    path: PathBuf,
    data: Map<String, Value>,
}

impl ManifestFile {
    /// @acp:summary "Load and validate a manifest from disk"
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse(path, &content)
    }

    /// Parse manifest text; the top level must be an object
    pub fn parse<P: AsRef<Path>>(path: P, content: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        match serde_json::from_str::<Value>(content)? {
            Value::Object(data) => Ok(Self { path, data }),
            _ => Err(ScriptsError::InvalidManifest {
                path,
                reason: "top-level value is not an object".to_string(),
            }),
        }
    }

    /// Where this manifest was read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw JSON object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn name(&self) -> Option<&str> {
        self.data.get("name").and_then(Value::as_str)
    }

    pub fn version(&self) -> Option<&str> {
        self.data.get("version").and_then(Value::as_str)
    }

    /// `homepage`, used to infer the served path
    pub fn homepage(&self) -> Option<&str> {
        self.data.get("homepage").and_then(Value::as_str)
    }

    pub fn scripts(&self) -> Option<&Map<String, Value>> {
        self.object("scripts")
    }

    pub fn dependencies(&self) -> Option<&Map<String, Value>> {
        self.object("dependencies")
    }

    pub fn dev_dependencies(&self) -> Option<&Map<String, Value>> {
        self.object("devDependencies")
    }

    pub fn resolutions(&self) -> Option<&Map<String, Value>> {
        self.object("resolutions")
    }

    /// Override block stored under `key` (e.g. `jest`)
    ///
    /// A key that is present but not an object is a manifest error rather than
    /// an empty block, so that it cannot slip past the allow-list.
    pub fn override_block(&self, key: &str) -> Result<Option<&Map<String, Value>>> {
        match self.data.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(block)) => Ok(Some(block)),
            Some(_) => Err(ScriptsError::InvalidManifest {
                path: self.path.clone(),
                reason: format!("\"{}\" must be an object", key),
            }),
        }
    }

    /// `browserslist` as an ordered list of queries
    ///
    /// Accepts either a plain list or the per-environment object form, in
    /// which case `env_name` selects the entry.
    pub fn browserslist(&self, env_name: &str) -> Option<Vec<String>> {
        let value = match self.data.get("browserslist")? {
            Value::Object(envs) => envs.get(env_name)?,
            other => other,
        };
        match value {
            Value::String(query) => Some(vec![query.clone()]),
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Whether the package depends on `name` in either dependency table
    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies().is_some_and(|d| d.contains_key(name))
            || self.dev_dependencies().is_some_and(|d| d.contains_key(name))
    }

    /// Mutable access to an object field, creating it when absent
    pub fn object_mut(&mut self, key: &str) -> &mut Map<String, Value> {
        let entry = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        match entry {
            Value::Object(map) => map,
            _ => unreachable!("entry was just replaced with an object"),
        }
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.data.insert(key.to_string(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.shift_remove(key)
    }

    /// Serialize with two-space indentation and a trailing newline
    pub fn to_pretty_string(&self) -> Result<String> {
        to_pretty_json(&self.data)
    }

    /// @acp:summary "Persist the manifest back to its own path"
    pub fn save(&self) -> Result<()> {
        std::fs::write(&self.path, self.to_pretty_string()?)?;
        Ok(())
    }

    fn object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.data.get(key).and_then(Value::as_object)
    }
}

/// @acp:summary "An npm package-lock.json"
#[derive(Debug, Clone, PartialEq)]
pub struct Lockfile {
    path: PathBuf,
    data: Map<String, Value>,
}

impl Lockfile {
    /// Load the lockfile next to a manifest, if there is one
    pub fn load_optional<P: AsRef<Path>>(project_root: P) -> Result<Option<Self>> {
        let path = project_root.as_ref().join(LOCKFILE_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(data) => Ok(Some(Self { path, data })),
            _ => Err(ScriptsError::InvalidManifest {
                path,
                reason: "top-level value is not an object".to_string(),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drop every record of `package` from the lockfile
    ///
    /// Covers both the v1 `dependencies` table and the v2/v3 `packages` table.
    /// Returns whether anything was removed.
    pub fn remove_package(&mut self, package: &str) -> bool {
        let mut removed = false;
        if let Some(Value::Object(deps)) = self.data.get_mut("dependencies") {
            removed |= deps.shift_remove(package).is_some();
        }
        if let Some(Value::Object(packages)) = self.data.get_mut("packages") {
            removed |= packages
                .shift_remove(&format!("node_modules/{}", package))
                .is_some();
        }
        removed
    }

    pub fn contains_package(&self, package: &str) -> bool {
        let in_deps = self
            .data
            .get("dependencies")
            .and_then(Value::as_object)
            .is_some_and(|d| d.contains_key(package));
        let in_packages = self
            .data
            .get("packages")
            .and_then(Value::as_object)
            .is_some_and(|p| p.contains_key(&format!("node_modules/{}", package)));
        in_deps || in_packages
    }

    pub fn save(&self) -> Result<()> {
        std::fs::write(&self.path, to_pretty_json(&self.data)?)?;
        Ok(())
    }
}

fn to_pretty_json(data: &Map<String, Value>) -> Result<String> {
    let mut content = serde_json::to_string_pretty(data)?;
    content.push('\n');
    Ok(content)
}
