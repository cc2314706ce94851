//! @acp:module "Override Merger"
//! @acp:summary "Validates and merges allow-listed project overrides into synthesized configs"
//! @acp:domain cli
//! @acp:layer service
//!
//! Overrides are checked against a closed allow-list per config kind. Any key
//! outside it rejects the whole block, listing every offending key, and the
//! base configuration is left untouched: merging always works on a copy.

pub mod keys;

pub use keys::{AllowedKey, BuildOverrideKey, TestOverrideKey};

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{Result, ScriptsError, UnsupportedOverride};
use crate::jest::TestConfig;
use crate::manifest::ManifestFile;
use crate::webpack::BuildConfig;

/// @acp:summary "Which synthesized configuration an override block targets"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKind {
    Build,
    Test,
}

impl ConfigKind {
    /// package.json key holding this kind's override block
    pub fn manifest_key(&self) -> &'static str {
        match self {
            ConfigKind::Build => "solidScripts",
            ConfigKind::Test => "jest",
        }
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKind::Build => write!(f, "build"),
            ConfigKind::Test => write!(f, "test"),
        }
    }
}

/// @acp:summary "A synthesized configuration that accepts allow-listed overrides"
pub trait Overridable: Clone {
    type Key: AllowedKey;
    const KIND: ConfigKind;

    /// Replace the field behind `key` with `value`
    fn apply(&mut self, key: Self::Key, value: &Value) -> Result<()>;
}

/// @acp:summary "Merge an override block into a copy of `base`"
///
/// Unknown keys are all collected before anything is applied, so a rejected
/// block never yields a partially merged value.
pub fn merge<C: Overridable>(base: &C, overrides: &Map<String, Value>) -> Result<C> {
    let mut accepted = Vec::with_capacity(overrides.len());
    let mut rejected = Vec::new();

    for (key, value) in overrides {
        match C::Key::parse(key) {
            Some(allowed) => accepted.push((allowed, value)),
            None => rejected.push(key.clone()),
        }
    }

    if !rejected.is_empty() {
        rejected.sort();
        tracing::debug!(kind = %C::KIND, keys = ?rejected, "rejected overrides");
        return Err(UnsupportedOverride {
            kind: C::KIND,
            keys: rejected,
            supported: C::Key::names(),
        }
        .into());
    }

    // Apply in allow-list order regardless of manifest order
    accepted.sort_by_key(|(key, _)| C::Key::ALL.iter().position(|k| k == key));

    let mut merged = base.clone();
    for (key, value) in accepted {
        merged.apply(key, value)?;
        tracing::debug!(kind = %C::KIND, key = key.as_str(), "applied override");
    }
    Ok(merged)
}

/// Merge the override block the manifest declares for `C`, if any
pub fn merge_from_manifest<C: Overridable>(base: &C, manifest: &ManifestFile) -> Result<C> {
    match manifest.override_block(C::KIND.manifest_key())? {
        Some(block) => merge(base, block),
        None => Ok(base.clone()),
    }
}

impl Overridable for TestConfig {
    type Key = TestOverrideKey;
    const KIND: ConfigKind = ConfigKind::Test;

    fn apply(&mut self, key: TestOverrideKey, value: &Value) -> Result<()> {
        let name = key.as_str();
        match key {
            TestOverrideKey::CollectCoverageFrom => {
                self.collect_coverage_from = string_list(name, value)?
            }
            TestOverrideKey::CoverageReporters => {
                expect_array(name, value)?;
                self.coverage_reporters = Some(value.clone());
            }
            TestOverrideKey::CoverageThreshold => {
                expect_object(name, value)?;
                self.coverage_threshold = Some(value.clone());
            }
            TestOverrideKey::ExtraGlobals => self.extra_globals = Some(string_list(name, value)?),
            TestOverrideKey::GlobalSetup => self.global_setup = Some(string(name, value)?),
            TestOverrideKey::GlobalTeardown => self.global_teardown = Some(string(name, value)?),
            TestOverrideKey::ResetMocks => self.reset_mocks = Some(boolean(name, value)?),
            TestOverrideKey::ResetModules => self.reset_modules = Some(boolean(name, value)?),
            TestOverrideKey::SnapshotSerializers => {
                self.snapshot_serializers = Some(string_list(name, value)?)
            }
            TestOverrideKey::WatchPathIgnorePatterns => {
                self.watch_path_ignore_patterns = Some(string_list(name, value)?)
            }
        }
        Ok(())
    }
}

impl Overridable for BuildConfig {
    type Key = BuildOverrideKey;
    const KIND: ConfigKind = ConfigKind::Build;

    fn apply(&mut self, key: BuildOverrideKey, value: &Value) -> Result<()> {
        let name = key.as_str();
        match key {
            BuildOverrideKey::Externals => match value {
                Value::Object(_) | Value::Array(_) | Value::String(_) => {
                    self.externals = Some(value.clone())
                }
                _ => return Err(invalid(name, "an object, array or string")),
            },
            BuildOverrideKey::Node => self.node = expect_object(name, value)?.clone(),
            BuildOverrideKey::Performance => match value {
                Value::Bool(false) | Value::Object(_) => self.performance = value.clone(),
                _ => return Err(invalid(name, "false or an object")),
            },
        }
        Ok(())
    }
}

fn invalid(key: &str, expected: &'static str) -> ScriptsError {
    ScriptsError::InvalidOverrideValue {
        key: key.to_string(),
        expected,
    }
}

fn string_list(key: &str, value: &Value) -> Result<Vec<String>> {
    expect_array(key, value)?
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(key, "an array of strings"))
        })
        .collect()
}

fn string(key: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(key, "a string"))
}

fn boolean(key: &str, value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| invalid(key, "a boolean"))
}

fn expect_array<'a>(key: &str, value: &'a Value) -> Result<&'a Vec<Value>> {
    value.as_array().ok_or_else(|| invalid(key, "an array"))
}

fn expect_object<'a>(key: &str, value: &'a Value) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| invalid(key, "an object"))
}
