//! @acp:module "Test Runner Config"
//! @acp:summary "Synthesizes the test-runner configuration from project paths"
//! @acp:domain cli
//! @acp:layer service
//!
//! Every file the test runner can import is routed through a transform:
//! scripts go to the transpiler, stylesheets to a stub and anything else to a
//! file-reference mock, so assets are never parsed as code.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::paths::{PathSet, MODULE_FILE_EXTENSIONS};

/// Placeholder the test runner expands to the project root
pub const ROOT_DIR: &str = "<rootDir>";

/// @acp:summary "Transform applied to a class of imported files"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    /// Script and markup files, compiled by the transpiler
    Script,
    /// Stylesheets, replaced by an empty module
    Stylesheet,
    /// Any other asset, replaced by its file name
    FileReference,
}

impl TransformKind {
    /// Match pattern handed to the test runner
    pub fn pattern(&self) -> &'static str {
        match self {
            TransformKind::Script => r"^.+\.(js|jsx|ts|tsx)$",
            TransformKind::Stylesheet => r"^.+\.css$",
            TransformKind::FileReference => r"^(?!.*\.(js|jsx|ts|tsx|css|json)$)",
        }
    }

    /// Transformer module, relative to the tool installation
    pub fn transformer(&self) -> &'static str {
        match self {
            TransformKind::Script => "config/jest/babelTransform.js",
            TransformKind::Stylesheet => "config/jest/cssTransform.js",
            TransformKind::FileReference => "config/jest/fileTransform.js",
        }
    }

    /// Whether this transform claims a file with extension `ext`
    ///
    /// Mirrors `pattern()`; JSON is left to the runner's native loader.
    pub fn accepts(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        match self {
            TransformKind::Script => matches!(ext.as_str(), "js" | "jsx" | "ts" | "tsx"),
            TransformKind::Stylesheet => ext == "css",
            TransformKind::FileReference => {
                !matches!(ext.as_str(), "js" | "jsx" | "ts" | "tsx" | "css" | "json")
            }
        }
    }
}

/// One entry of the ordered transform table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRule {
    pub kind: TransformKind,
    pub transformer: PathBuf,
}

/// @acp:summary "Complete test-runner configuration"
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConfig {
    #[serde(skip)]
    pub paths: PathSet,
    pub root_dir: PathBuf,
    pub collect_coverage_from: Vec<String>,
    pub setup_files: Vec<String>,
    pub setup_files_after_env: Vec<String>,
    pub test_match: Vec<String>,
    pub test_environment: String,
    #[serde(serialize_with = "serialize_transforms")]
    pub transform: Vec<TransformRule>,
    pub transform_ignore_patterns: Vec<String>,
    pub module_paths: Vec<String>,
    #[serde(serialize_with = "serialize_pairs")]
    pub module_name_mapper: Vec<(String, String)>,
    pub module_file_extensions: Vec<String>,
    pub watch_plugins: Vec<String>,

    // Fields a project may set through its `jest` block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_reporters: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_threshold: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_globals: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_setup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_teardown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_mocks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_modules: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_serializers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_path_ignore_patterns: Option<Vec<String>>,
}

impl TestConfig {
    /// Transform the runner would apply to `file`, if any
    pub fn transform_for(&self, file: &Path) -> Option<&TransformRule> {
        let ext = file.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.transform.iter().find(|rule| rule.kind.accepts(ext))
    }

    /// @acp:summary "Anchor transformer paths at the tool installation"
    pub fn with_tool_root(mut self, tool_root: &Path) -> Self {
        for rule in &mut self.transform {
            rule.transformer = tool_root.join(rule.kind.transformer());
        }
        self
    }
}

/// @acp:summary "Produce the test-runner configuration for a project"
pub fn synthesize(paths: &PathSet) -> TestConfig {
    let setup_after_env = setup_file_reference(&paths.test_setup)
        .into_iter()
        .collect::<Vec<_>>();

    tracing::debug!(setup = ?setup_after_env, "synthesized test config");

    TestConfig {
        paths: paths.clone(),
        root_dir: paths.root.clone(),
        collect_coverage_from: vec![
            "src/**/*.{js,jsx,ts,tsx}".to_string(),
            "!src/**/*.d.ts".to_string(),
        ],
        setup_files: vec!["react-app-polyfill/jsdom".to_string()],
        setup_files_after_env: setup_after_env,
        test_match: vec![
            format!("{}/src/**/__tests__/**/*.{{js,jsx,ts,tsx}}", ROOT_DIR),
            format!("{}/src/**/*.{{spec,test}}.{{js,jsx,ts,tsx}}", ROOT_DIR),
        ],
        test_environment: "jest-environment-jsdom".to_string(),
        transform: [
            TransformKind::Script,
            TransformKind::Stylesheet,
            TransformKind::FileReference,
        ]
        .into_iter()
        .map(|kind| TransformRule {
            kind,
            transformer: PathBuf::from(kind.transformer()),
        })
        .collect(),
        transform_ignore_patterns: vec![
            r"[/\\]node_modules[/\\].+\.(cjs|js|jsx|ts|tsx)$".to_string(),
            r"^.+\.module\.(css|sass|scss)$".to_string(),
        ],
        module_paths: Vec::new(),
        module_name_mapper: vec![(
            r"^.+\.module\.(css|sass|scss)$".to_string(),
            "identity-obj-proxy".to_string(),
        )],
        module_file_extensions: MODULE_FILE_EXTENSIONS
            .iter()
            .copied()
            .chain(std::iter::once("node"))
            .filter(|ext| !ext.contains("mjs"))
            .map(str::to_string)
            .collect(),
        watch_plugins: vec![
            "jest-watch-typeahead/filename".to_string(),
            "jest-watch-typeahead/testname".to_string(),
        ],
        coverage_reporters: None,
        coverage_threshold: None,
        extra_globals: None,
        global_setup: None,
        global_teardown: None,
        reset_mocks: None,
        reset_modules: None,
        snapshot_serializers: None,
        watch_path_ignore_patterns: None,
    }
}

/// Reference to the setup file, if the project has one
///
/// The extension is taken from the conventional file name so the reference
/// stays root-relative (and therefore portable after ejection).
fn setup_file_reference(test_setup: &Path) -> Option<String> {
    if !test_setup.is_file() {
        return None;
    }
    let text = test_setup.to_string_lossy();
    let extension = Regex::new(r"src[/\\]setupTests\.(.+)$")
        .ok()
        .and_then(|re| re.captures(&text).map(|c| c[1].to_string()))
        .unwrap_or_else(|| "js".to_string());
    Some(format!("{}/src/setupTests.{}", ROOT_DIR, extension))
}

fn serialize_transforms<S: Serializer>(
    rules: &[TransformRule],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(rules.len()))?;
    for rule in rules {
        map.serialize_entry(rule.kind.pattern(), &rule.transformer)?;
    }
    map.end()
}

fn serialize_pairs<S: Serializer>(
    pairs: &[(String, String)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(pairs.len()))?;
    for (key, value) in pairs {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> (TempDir, PathSet) {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("src")).unwrap();
        let paths = PathSet::for_root(temp.path());
        (temp, paths)
    }

    #[test]
    fn test_no_setup_file() {
        let (_temp, paths) = project();
        let config = synthesize(&paths);
        assert!(config.setup_files_after_env.is_empty());
    }

    #[test]
    fn test_setup_file_extension_preserved() {
        let (temp, _) = project();
        std::fs::write(temp.path().join("src").join("setupTests.ts"), "").unwrap();
        let paths = PathSet::for_root(temp.path());

        let config = synthesize(&paths);
        assert_eq!(config.setup_files_after_env, vec!["<rootDir>/src/setupTests.ts"]);
    }

    #[test]
    fn test_transform_routing() {
        let (_temp, paths) = project();
        let config = synthesize(&paths);

        let kind = |file: &str| config.transform_for(Path::new(file)).map(|r| r.kind);
        assert_eq!(kind("src/App.tsx"), Some(TransformKind::Script));
        assert_eq!(kind("src/App.css"), Some(TransformKind::Stylesheet));
        assert_eq!(kind("src/logo.svg"), Some(TransformKind::FileReference));
        assert_eq!(kind("src/data.json"), None);
    }

    #[test]
    fn test_module_file_extensions_drop_mjs() {
        let (_temp, paths) = project();
        let config = synthesize(&paths);
        assert!(config.module_file_extensions.contains(&"node".to_string()));
        assert!(!config.module_file_extensions.iter().any(|e| e.contains("mjs")));
    }

    #[test]
    fn test_serialized_shape() {
        let (_temp, paths) = project();
        let config = synthesize(&paths).with_tool_root(Path::new("/opt/solid-scripts"));
        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(
            value["transform"][TransformKind::Stylesheet.pattern()],
            "/opt/solid-scripts/config/jest/cssTransform.js"
        );
        assert_eq!(
            value["moduleNameMapper"][r"^.+\.module\.(css|sass|scss)$"],
            "identity-obj-proxy"
        );
        assert_eq!(value["setupFiles"], serde_json::json!(["react-app-polyfill/jsdom"]));
        assert!(value.get("resetMocks").is_none());
        assert!(value.get("paths").is_none());
    }
}
