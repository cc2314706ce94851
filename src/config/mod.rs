//! @acp:module "Configuration"
//! @acp:summary "Tool settings derived once from the process environment"
//! @acp:domain cli
//! @acp:layer config
//!
//! Settings are read a single time at startup and handed down explicitly.
//! Synthesis code never touches `std::env` itself, which keeps every
//! synthesized configuration a pure function of its inputs.

use std::path::PathBuf;

/// Prefix that marks a variable as safe to inline into client bundles
pub const CLIENT_VAR_PREFIX: &str = "SOLID_APP_";

/// @acp:summary "Environment-driven tool settings"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// `GENERATE_SOURCEMAP`; only consulted for production builds
    pub generate_sourcemap: Option<bool>,

    /// `PUBLIC_URL` override for the served path
    pub public_url: Option<String>,

    /// Interpreter used to run the bundled scripts
    pub node_binary: String,

    /// `SOLID_SCRIPTS_HOME`: explicit location of the tool installation
    pub bundle_root: Option<PathBuf>,

    /// `SOLID_APP_*` variables, in the order they were found
    pub client_vars: Vec<(String, String)>,

    /// Running under continuous integration
    pub ci: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            generate_sourcemap: None,
            public_url: None,
            node_binary: "node".to_string(),
            bundle_root: None,
            client_vars: Vec::new(),
            ci: false,
        }
    }
}

impl Settings {
    /// @acp:summary "Read settings from the current process environment"
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// @acp:summary "Build settings from an explicit variable list"
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut settings = Settings::default();

        for (key, value) in vars {
            let key = key.into();
            let value = value.into();
            match key.as_str() {
                "GENERATE_SOURCEMAP" => settings.generate_sourcemap = parse_bool(&value),
                "PUBLIC_URL" => settings.public_url = Some(value),
                "SOLID_SCRIPTS_NODE" if !value.is_empty() => settings.node_binary = value,
                "SOLID_SCRIPTS_HOME" if !value.is_empty() => {
                    settings.bundle_root = Some(PathBuf::from(value))
                }
                "CI" => settings.ci = parse_bool(&value).unwrap_or(!value.is_empty()),
                _ if key.starts_with(CLIENT_VAR_PREFIX) => settings.client_vars.push((key, value)),
                _ => {}
            }
        }

        // Environment iteration order is unspecified
        settings.client_vars.sort();
        settings
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
