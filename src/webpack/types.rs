//! @acp:module "Build Config Types"
//! @acp:summary "Data model handed to the bundler"
//! @acp:domain cli
//! @acp:layer model

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::env::{EnvironmentDescriptor, Mode};
use crate::paths::PathSet;

/// @acp:summary "Compiled match pattern that serializes as its source text"
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Compile a built-in pattern
    ///
    /// Only used for patterns defined in this crate, all of which are
    /// exercised by the synthesis tests.
    pub(crate) fn builtin(source: &str) -> Self {
        Self(Regex::new(source).expect("built-in pattern must compile"))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.0.is_match(haystack)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.as_str())
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// @acp:summary "Identity of each built-in module rule, in precedence order"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    ImageAsset,
    ElementTypeScript,
    SourceTypeScript,
    ElementJavaScript,
    SourceJavaScript,
    DependencyJavaScript,
    ElementCss,
    ElementSass,
    CssModule,
    SassModule,
    Css,
    Sass,
    FileAsset,
}

/// One loader invocation inside a rule's processing chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingStep {
    pub loader: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

impl ProcessingStep {
    pub fn new(loader: &str) -> Self {
        Self {
            loader: loader.to_string(),
            options: None,
        }
    }

    pub fn with_options(loader: &str, options: Value) -> Self {
        Self {
            loader: loader.to_string(),
            options: Some(options),
        }
    }
}

/// @acp:summary "A file-matching rule and the chain that processes matching files"
///
/// A rule matches a path when any `test` pattern matches (or `test` is empty),
/// the path lies under an `include` directory (or `include` is empty), and no
/// `exclude` directory or `exclude_patterns` entry applies.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRule {
    pub kind: RuleKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub test: Vec<Pattern>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_patterns: Vec<Pattern>,
    #[serde(rename = "use")]
    pub chain: Vec<ProcessingStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side_effects: Option<bool>,
}

impl ModuleRule {
    pub fn new(kind: RuleKind, test: &[&str]) -> Self {
        Self {
            kind,
            test: test.iter().map(|p| Pattern::builtin(p)).collect(),
            include: Vec::new(),
            exclude: Vec::new(),
            exclude_patterns: Vec::new(),
            chain: Vec::new(),
            side_effects: None,
        }
    }

    pub fn include(mut self, dir: &Path) -> Self {
        self.include.push(dir.to_path_buf());
        self
    }

    pub fn exclude(mut self, dir: &Path) -> Self {
        self.exclude.push(dir.to_path_buf());
        self
    }

    pub fn exclude_pattern(mut self, pattern: &str) -> Self {
        self.exclude_patterns.push(Pattern::builtin(pattern));
        self
    }

    pub fn step(mut self, step: ProcessingStep) -> Self {
        self.chain.push(step);
        self
    }

    pub fn steps(mut self, steps: Vec<ProcessingStep>) -> Self {
        self.chain.extend(steps);
        self
    }

    pub fn side_effects(mut self, side_effects: bool) -> Self {
        self.side_effects = Some(side_effects);
        self
    }

    /// Whether this rule claims `path`
    pub fn matches(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();

        let tested = self.test.is_empty() || self.test.iter().any(|p| p.is_match(&text));
        let included = self.include.is_empty() || self.include.iter().any(|d| path.starts_with(d));
        let excluded = self.exclude.iter().any(|d| path.starts_with(d))
            || self.exclude_patterns.iter().any(|p| p.is_match(&text));

        tested && included && !excluded
    }

    /// Loader names in application order
    pub fn loaders(&self) -> Vec<&str> {
        self.chain.iter().map(|s| s.loader.as_str()).collect()
    }
}

/// @acp:summary "Output location and file naming"
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub pathinfo: bool,
    pub filename: String,
    pub chunk_filename: String,
    pub public_path: String,
}

/// Minifier plugged into the optimization stage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "name", rename_all = "kebab-case")]
pub enum Minimizer {
    #[serde(rename_all = "camelCase")]
    Terser { parallel: bool, source_map: bool },
    OptimizeCssAssets,
}

/// @acp:summary "Minification, CSS extraction and code-splitting policy"
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationPolicy {
    pub minimize: bool,
    pub minimizer: Vec<Minimizer>,
    pub extract_css: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_chunks: Option<SplitChunks>,
    pub runtime_chunk: bool,
}

impl OptimizationPolicy {
    pub fn code_splitting(&self) -> bool {
        self.split_chunks.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitChunks {
    pub chunks: String,
    pub name: bool,
}

/// Module resolution settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolveConfig {
    pub modules: Vec<PathBuf>,
    pub extensions: Vec<String>,
    pub alias: Map<String, Value>,
}

/// When a plugin is part of the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginScope {
    Always,
    DevelopmentOnly,
    ProductionOnly,
}

impl PluginScope {
    pub fn applies_to(&self, mode: Mode) -> bool {
        match self {
            PluginScope::Always => true,
            PluginScope::DevelopmentOnly => mode == Mode::Development,
            PluginScope::ProductionOnly => mode == Mode::Production,
        }
    }
}

/// @acp:summary "Bundler plugins solid-scripts knows how to configure"
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "plugin", rename_all = "kebab-case")]
pub enum PluginSpec {
    HtmlShell {
        template: PathBuf,
        inject: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        minify: Option<Value>,
    },
    InterpolateHtml {
        replacements: Map<String, Value>,
    },
    Define {
        definitions: Map<String, Value>,
    },
    HotModuleReplacement,
    CaseSensitivePaths,
    WatchMissingNodeModules {
        node_modules: PathBuf,
    },
    #[serde(rename_all = "camelCase")]
    ExtractCssChunks {
        filename: String,
        chunk_filename: String,
    },
    #[serde(rename_all = "camelCase")]
    AssetManifest {
        file_name: String,
        public_path: String,
    },
    IgnoreMomentLocales,
    #[serde(rename_all = "camelCase")]
    GenerateServiceWorker {
        clients_claim: bool,
        exclude: Vec<String>,
        navigate_fallback: String,
        navigate_fallback_denylist: Vec<String>,
    },
}

impl PluginSpec {
    pub fn name(&self) -> &'static str {
        match self {
            PluginSpec::HtmlShell { .. } => "html-shell",
            PluginSpec::InterpolateHtml { .. } => "interpolate-html",
            PluginSpec::Define { .. } => "define",
            PluginSpec::HotModuleReplacement => "hot-module-replacement",
            PluginSpec::CaseSensitivePaths => "case-sensitive-paths",
            PluginSpec::WatchMissingNodeModules { .. } => "watch-missing-node-modules",
            PluginSpec::ExtractCssChunks { .. } => "extract-css-chunks",
            PluginSpec::AssetManifest { .. } => "asset-manifest",
            PluginSpec::IgnoreMomentLocales => "ignore-moment-locales",
            PluginSpec::GenerateServiceWorker { .. } => "generate-service-worker",
        }
    }

    pub fn scope(&self) -> PluginScope {
        match self {
            PluginSpec::HtmlShell { .. }
            | PluginSpec::InterpolateHtml { .. }
            | PluginSpec::Define { .. }
            | PluginSpec::IgnoreMomentLocales => PluginScope::Always,
            PluginSpec::HotModuleReplacement
            | PluginSpec::CaseSensitivePaths
            | PluginSpec::WatchMissingNodeModules { .. } => PluginScope::DevelopmentOnly,
            PluginSpec::ExtractCssChunks { .. }
            | PluginSpec::AssetManifest { .. }
            | PluginSpec::GenerateServiceWorker { .. } => PluginScope::ProductionOnly,
        }
    }
}

/// @acp:summary "Complete bundler configuration for one invocation"
///
/// Values are produced fresh by `synthesize`; overrides yield a new value
/// rather than editing one in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    pub mode: Mode,
    pub environment: EnvironmentDescriptor,
    pub paths: PathSet,
    pub bail: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devtool: Option<String>,
    pub entry: PathBuf,
    pub output: OutputConfig,
    pub optimization: OptimizationPolicy,
    pub resolve: ResolveConfig,
    pub strict_export_presence: bool,
    /// First match wins; narrower patterns precede broader ones
    pub module_rules: Vec<ModuleRule>,
    pub plugins: Vec<PluginSpec>,
    pub node: Map<String, Value>,
    pub performance: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub externals: Option<Value>,
}

impl BuildConfig {
    /// @acp:summary "The rule that processes `path` under first-match-wins"
    pub fn resolve_rule(&self, path: &Path) -> Option<&ModuleRule> {
        self.module_rules.iter().find(|rule| rule.matches(path))
    }

    /// Every rule that would match `path`, in sequence order
    pub fn matching_rules(&self, path: &Path) -> Vec<&ModuleRule> {
        self.module_rules
            .iter()
            .filter(|rule| rule.matches(path))
            .collect()
    }

    pub fn rule(&self, kind: RuleKind) -> Option<&ModuleRule> {
        self.module_rules.iter().find(|rule| rule.kind == kind)
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p.name() == name)
    }

    pub fn plugin_names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(PluginSpec::name).collect()
    }
}
