//! @acp:module "Environment"
//! @acp:summary "Build mode and the flags derived from it"
//! @acp:domain cli
//! @acp:layer model

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::Settings;
use crate::manifest::ManifestFile;
use crate::paths::served_path;

/// @acp:summary "The two supported build modes"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }

    /// Development always maps sources; production only when the toggle is set
    fn source_maps(&self, toggle: Option<bool>) -> bool {
        match self {
            Mode::Production => toggle.unwrap_or(false),
            Mode::Development => true,
        }
    }

    fn default_browser_targets(&self) -> Vec<String> {
        let targets: &[&str] = match self {
            Mode::Production => &[">0.2%", "not dead", "not op_mini all"],
            Mode::Development => &[
                "last 1 chrome version",
                "last 1 firefox version",
                "last 1 safari version",
            ],
        };
        targets.iter().map(|t| t.to_string()).collect()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// @acp:summary "Immutable per-invocation description of the build environment"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentDescriptor {
    pub mode: Mode,
    pub source_maps: bool,
    /// Always ends in `/`
    pub public_path: String,
    /// `public_path` without its trailing slash; `%PUBLIC_URL%` in HTML
    pub public_url: String,
    pub browser_targets: Vec<String>,
    pub client: ClientEnvironment,
}

impl EnvironmentDescriptor {
    /// @acp:summary "Derive the environment for `mode` from settings and the project manifest"
    pub fn new(mode: Mode, settings: &Settings, manifest: Option<&ManifestFile>) -> Self {
        let source_maps = mode.source_maps(settings.generate_sourcemap);

        // Development always serves from the root; PUBLIC_URL only shapes builds
        let public_path = match mode {
            Mode::Production => served_path(
                settings.public_url.as_deref(),
                manifest.and_then(ManifestFile::homepage),
            ),
            Mode::Development => "/".to_string(),
        };
        let public_url = public_path.trim_end_matches('/').to_string();

        let browser_targets = manifest
            .and_then(|m| m.browserslist(mode.as_str()))
            .filter(|targets| !targets.is_empty())
            .unwrap_or_else(|| mode.default_browser_targets());

        let client = ClientEnvironment::new(mode.as_str(), &public_url, &settings.client_vars);

        tracing::debug!(
            mode = %mode,
            source_maps,
            public_path = %public_path,
            "environment resolved"
        );

        Self {
            mode,
            source_maps,
            public_path,
            public_url,
            browser_targets,
            client,
        }
    }

    pub fn is_production(&self) -> bool {
        self.mode == Mode::Production
    }

    pub fn is_development(&self) -> bool {
        self.mode == Mode::Development
    }

    /// Assets reference each other relatively (`homepage: "."`)
    pub fn uses_relative_asset_paths(&self) -> bool {
        self.public_path == "./"
    }
}

/// @acp:summary "Variables injected into the client bundle and index.html"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientEnvironment {
    /// Name/value pairs in injection order
    pub raw: Vec<(String, String)>,
}

impl ClientEnvironment {
    pub fn new(node_env: &str, public_url: &str, client_vars: &[(String, String)]) -> Self {
        let mut raw = vec![
            ("NODE_ENV".to_string(), node_env.to_string()),
            ("PUBLIC_URL".to_string(), public_url.to_string()),
        ];
        raw.extend(client_vars.iter().cloned());
        Self { raw }
    }

    /// Raw values keyed by name, for `%NAME%` interpolation in HTML
    pub fn raw_map(&self) -> Map<String, Value> {
        self.raw
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }

    /// `process.env.NAME` → JSON source literal, for compile-time replacement
    pub fn stringified(&self) -> Map<String, Value> {
        self.raw
            .iter()
            .map(|(k, v)| {
                (
                    format!("process.env.{}", k),
                    Value::String(Value::String(v.clone()).to_string()),
                )
            })
            .collect()
    }
}
