#![forbid(unsafe_code)]

//! @acp:module "Solid Scripts Library"
//! @acp:summary "Build and test configuration synthesis, override merging and ejection"
//! @acp:domain cli
//! @acp:layer api
//! @acp:stability stable
//!
//! # solid-scripts
//!
//! Zero-configuration build tooling for Solid applications.
//!
//! ## Features
//!
//! - **Synthesis**: bundler and test-runner configs derived from the build mode
//! - **Overrides**: a closed allow-list of keys a project may change in `package.json`
//! - **Ejection**: a one-way copy of the bundled config and scripts into the project
//!
//! ## Example
//!
//! ```rust,no_run
//! use solid_scripts::{merge_from_manifest, webpack, EnvironmentDescriptor, ManifestFile, Mode, PathSet, Settings};
//!
//! fn main() -> solid_scripts::Result<()> {
//!     let settings = Settings::from_env();
//!     let paths = PathSet::discover(".")?;
//!     let manifest = ManifestFile::load(&paths.manifest)?;
//!
//!     let env = EnvironmentDescriptor::new(Mode::Production, &settings, Some(&manifest));
//!     let config = merge_from_manifest(&webpack::synthesize(&env, &paths), &manifest)?;
//!
//!     println!("{}", serde_json::to_string_pretty(&config)?);
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod config;
pub mod eject;
pub mod env;
pub mod error;
pub mod jest;
pub mod manifest;
pub mod overrides;
pub mod paths;
pub mod runner;
pub mod webpack;

// Re-exports
pub use config::Settings;
pub use eject::{
    AssumeYes, Confirmation, EjectReport, EjectStep, EjectionEngine, InteractivePrompt, StepStatus,
    ToolBundle,
};
pub use env::{EnvironmentDescriptor, Mode};
pub use error::{Result, ScriptsError, UnsupportedOverride};
pub use jest::TestConfig;
pub use manifest::{Lockfile, ManifestFile};
pub use overrides::{merge, merge_from_manifest, BuildOverrideKey, ConfigKind, Overridable, TestOverrideKey};
pub use paths::PathSet;
pub use runner::{Launch, ProcessOutcome};
pub use webpack::{BuildConfig, ModuleRule, PluginSpec, RuleKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
