//! @acp:module "Override Allow-lists"
//! @acp:summary "Closed sets of configuration fields a project may override"
//! @acp:domain cli
//! @acp:layer model

use std::fmt;

/// @acp:summary "A closed enumeration of overridable field names"
pub trait AllowedKey: Copy + Eq + fmt::Debug + 'static {
    /// Every member, in the order overrides are applied and listed
    const ALL: &'static [Self];

    /// Field name as written in package.json
    fn as_str(&self) -> &'static str;

    fn parse(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == key)
    }

    fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|k| k.as_str()).collect()
    }
}

/// @acp:summary "Test-runner fields a project may set in its `jest` block"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestOverrideKey {
    CollectCoverageFrom,
    CoverageReporters,
    CoverageThreshold,
    ExtraGlobals,
    GlobalSetup,
    GlobalTeardown,
    ResetMocks,
    ResetModules,
    SnapshotSerializers,
    WatchPathIgnorePatterns,
}

impl AllowedKey for TestOverrideKey {
    const ALL: &'static [Self] = &[
        TestOverrideKey::CollectCoverageFrom,
        TestOverrideKey::CoverageReporters,
        TestOverrideKey::CoverageThreshold,
        TestOverrideKey::ExtraGlobals,
        TestOverrideKey::GlobalSetup,
        TestOverrideKey::GlobalTeardown,
        TestOverrideKey::ResetMocks,
        TestOverrideKey::ResetModules,
        TestOverrideKey::SnapshotSerializers,
        TestOverrideKey::WatchPathIgnorePatterns,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            TestOverrideKey::CollectCoverageFrom => "collectCoverageFrom",
            TestOverrideKey::CoverageReporters => "coverageReporters",
            TestOverrideKey::CoverageThreshold => "coverageThreshold",
            TestOverrideKey::ExtraGlobals => "extraGlobals",
            TestOverrideKey::GlobalSetup => "globalSetup",
            TestOverrideKey::GlobalTeardown => "globalTeardown",
            TestOverrideKey::ResetMocks => "resetMocks",
            TestOverrideKey::ResetModules => "resetModules",
            TestOverrideKey::SnapshotSerializers => "snapshotSerializers",
            TestOverrideKey::WatchPathIgnorePatterns => "watchPathIgnorePatterns",
        }
    }
}

/// @acp:summary "Bundler fields a project may set in its `solidScripts` block"
///
/// None of these can reorder module rules or drop required plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildOverrideKey {
    Externals,
    Node,
    Performance,
}

impl AllowedKey for BuildOverrideKey {
    const ALL: &'static [Self] = &[
        BuildOverrideKey::Externals,
        BuildOverrideKey::Node,
        BuildOverrideKey::Performance,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            BuildOverrideKey::Externals => "externals",
            BuildOverrideKey::Node => "node",
            BuildOverrideKey::Performance => "performance",
        }
    }
}
