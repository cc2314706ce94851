//! @acp:module "Errors"
//! @acp:summary "Error taxonomy for synthesis, override merging, ejection and process launch"
//! @acp:domain cli
//! @acp:layer model

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::overrides::ConfigKind;
use crate::runner::ProcessOutcome;

/// Library-wide result alias
pub type Result<T> = std::result::Result<T, ScriptsError>;

/// @acp:summary "All failures surfaced by solid-scripts"
#[derive(Debug, Error)]
pub enum ScriptsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No package.json found in {start} or any parent directory")]
    ProjectRootNotFound { start: PathBuf },

    #[error("Could not find a required entry file (searched {})", display_paths(.searched))]
    MissingEntry { searched: Vec<PathBuf> },

    #[error("Could not locate the solid-scripts installation (set SOLID_SCRIPTS_HOME)")]
    BundleNotFound,

    /// ConfigurationRejected: the override block names keys outside the allow-list
    #[error(transparent)]
    UnsupportedOverride(#[from] UnsupportedOverride),

    #[error("Override `{key}` must be {expected}")]
    InvalidOverrideValue { key: String, expected: &'static str },

    #[error("Invalid manifest {path}: {reason}")]
    InvalidManifest { path: PathBuf, reason: String },

    #[error("Ejection cancelled")]
    EjectionDeclined,

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    /// ExternalProcessFailure: the bundler or test runner died abnormally
    #[error("{outcome}")]
    ProcessFailure { outcome: ProcessOutcome },

    #[error("{0}")]
    Other(String),
}

impl ScriptsError {
    /// Process exit code the top-level boundary reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ScriptsError::ProcessFailure { outcome } => outcome.exit_code(),
            _ => 1,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// @acp:summary "Override keys rejected by the allow-list, reported all at once"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedOverride {
    /// Which configuration the override block targeted
    pub kind: ConfigKind,
    /// Every rejected key, sorted
    pub keys: Vec<String>,
    /// The allow-list the keys were checked against
    pub supported: Vec<&'static str>,
}

impl UnsupportedOverride {
    /// Key users reach for when they want a post-environment setup file
    pub const SETUP_FILE_KEY: &'static str = "setupFilesAfterEnv";

    /// Whether the rejection involves the setup-file key, which gets its own guidance
    pub fn is_setup_file_override(&self) -> bool {
        self.kind == ConfigKind::Test && self.keys.iter().any(|k| k == Self::SETUP_FILE_KEY)
    }
}

impl fmt::Display for UnsupportedOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unsupported {} override keys in package.json \"{}\": {}",
            self.kind,
            self.kind.manifest_key(),
            self.keys.join(", ")
        )
    }
}

impl std::error::Error for UnsupportedOverride {}
