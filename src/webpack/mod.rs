//! @acp:module "Bundler Config"
//! @acp:summary "Synthesizes the complete bundler configuration from environment and paths"
//! @acp:domain cli
//! @acp:layer service
//!
//! `synthesize` is a pure function: the same `EnvironmentDescriptor` and
//! `PathSet` always yield the same `BuildConfig`. The only filesystem probe is
//! `PathSet::uses_typescript`, which decides whether TypeScript extensions
//! are resolvable.

pub mod plugins;
pub mod rules;
pub mod types;

pub use types::{
    BuildConfig, Minimizer, ModuleRule, OptimizationPolicy, OutputConfig, Pattern, PluginScope,
    PluginSpec, ProcessingStep, ResolveConfig, RuleKind, SplitChunks,
};

use serde_json::{json, Map, Value};

use crate::env::{EnvironmentDescriptor, Mode};
use crate::paths::{PathSet, MODULE_FILE_EXTENSIONS};

/// Framework entry points swapped for their development builds outside production
const FRAMEWORK_ALIASES: &[(&str, &str, &str)] = &[
    ("solid-js$", "solid-js", "solid-js/dist/dev.js"),
    ("solid-js/web$", "solid-js/web", "solid-js/web/dist/dev.js"),
    ("solid-js/store$", "solid-js/store", "solid-js/store/dist/dev.js"),
];

/// @acp:summary "Produce the bundler configuration for one invocation"
pub fn synthesize(env: &EnvironmentDescriptor, paths: &PathSet) -> BuildConfig {
    let production = env.is_production();

    let devtool = match env.mode {
        Mode::Production => env.source_maps.then(|| "source-map".to_string()),
        Mode::Development => Some("cheap-module-source-map".to_string()),
    };

    let config = BuildConfig {
        mode: env.mode,
        environment: env.clone(),
        paths: paths.clone(),
        bail: production,
        devtool,
        entry: paths.entry.clone(),
        output: output(env, paths),
        optimization: optimization(env),
        resolve: resolve(env, paths),
        strict_export_presence: true,
        module_rules: rules::module_rules(env, paths),
        plugins: plugins::plugins(env, paths),
        node: node_mocks(),
        // Size hints come from the build script's own report
        performance: Value::Bool(false),
        externals: None,
    };

    tracing::debug!(
        mode = %env.mode,
        rules = config.module_rules.len(),
        plugins = ?config.plugin_names(),
        "synthesized build config"
    );

    config
}

fn output(env: &EnvironmentDescriptor, paths: &PathSet) -> OutputConfig {
    match env.mode {
        Mode::Production => OutputConfig {
            path: Some(paths.output.clone()),
            pathinfo: false,
            filename: "static/js/[name].[contenthash:8].js".to_string(),
            chunk_filename: "static/js/[name].[contenthash:8].chunk.js".to_string(),
            public_path: env.public_path.clone(),
        },
        Mode::Development => OutputConfig {
            path: None,
            pathinfo: true,
            filename: "static/js/bundle.js".to_string(),
            chunk_filename: "static/js/[name].chunk.js".to_string(),
            public_path: env.public_path.clone(),
        },
    }
}

fn optimization(env: &EnvironmentDescriptor) -> OptimizationPolicy {
    if env.is_production() {
        OptimizationPolicy {
            minimize: true,
            minimizer: vec![
                Minimizer::Terser {
                    parallel: true,
                    source_map: env.source_maps,
                },
                Minimizer::OptimizeCssAssets,
            ],
            extract_css: true,
            split_chunks: Some(SplitChunks {
                chunks: "all".to_string(),
                name: false,
            }),
            runtime_chunk: true,
        }
    } else {
        OptimizationPolicy {
            minimize: false,
            minimizer: Vec::new(),
            extract_css: false,
            split_chunks: None,
            runtime_chunk: false,
        }
    }
}

fn resolve(env: &EnvironmentDescriptor, paths: &PathSet) -> ResolveConfig {
    let typescript = paths.uses_typescript();
    let extensions = MODULE_FILE_EXTENSIONS
        .iter()
        .map(|ext| format!(".{}", ext))
        .filter(|ext| typescript || !ext.contains("ts"))
        .collect();

    let alias = FRAMEWORK_ALIASES
        .iter()
        .map(|(key, production, development)| {
            let target = if env.is_production() { production } else { development };
            (key.to_string(), Value::String(target.to_string()))
        })
        .collect();

    ResolveConfig {
        modules: vec!["node_modules".into(), paths.node_modules.clone()],
        extensions,
        alias,
    }
}

/// Node built-ins some browser packages import but never use
fn node_mocks() -> Map<String, Value> {
    let mocks = json!({
        "module": "empty",
        "dgram": "empty",
        "dns": "mock",
        "fs": "empty",
        "http2": "empty",
        "net": "empty",
        "tls": "empty",
        "child_process": "empty"
    });
    match mocks {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use std::path::Path;
    use tempfile::TempDir;

    fn config(mode: Mode, root: &Path) -> BuildConfig {
        let env = EnvironmentDescriptor::new(mode, &Settings::default(), None);
        synthesize(&env, &PathSet::for_root(root))
    }

    #[test]
    fn test_output_naming_by_mode() {
        let prod = config(Mode::Production, Path::new("/app"));
        assert_eq!(prod.output.filename, "static/js/[name].[contenthash:8].js");
        assert_eq!(prod.output.path.as_deref(), Some(Path::new("/app/build")));
        assert!(prod.bail);

        let dev = config(Mode::Development, Path::new("/app"));
        assert_eq!(dev.output.filename, "static/js/bundle.js");
        assert!(dev.output.path.is_none());
        assert!(dev.output.pathinfo);
        assert_eq!(dev.devtool.as_deref(), Some("cheap-module-source-map"));
    }

    #[test]
    fn test_devtool_toggle_only_shapes_builds() {
        let off = Settings {
            generate_sourcemap: Some(false),
            ..Settings::default()
        };
        let dev = synthesize(
            &EnvironmentDescriptor::new(Mode::Development, &off, None),
            &PathSet::for_root("/app"),
        );
        assert_eq!(dev.devtool.as_deref(), Some("cheap-module-source-map"));

        let prod = config(Mode::Production, Path::new("/app"));
        assert!(prod.devtool.is_none());

        let on = Settings {
            generate_sourcemap: Some(true),
            ..Settings::default()
        };
        let prod = synthesize(
            &EnvironmentDescriptor::new(Mode::Production, &on, None),
            &PathSet::for_root("/app"),
        );
        assert_eq!(prod.devtool.as_deref(), Some("source-map"));
    }

    #[test]
    fn test_typescript_extensions_follow_tsconfig() {
        let temp = TempDir::new().unwrap();
        let without = config(Mode::Development, temp.path());
        assert!(!without.resolve.extensions.iter().any(|e| e == ".tsx"));

        std::fs::write(temp.path().join("tsconfig.json"), "{}").unwrap();
        let with = config(Mode::Development, temp.path());
        assert!(with.resolve.extensions.iter().any(|e| e == ".tsx"));
    }

    #[test]
    fn test_framework_aliases() {
        let dev = config(Mode::Development, Path::new("/app"));
        assert_eq!(dev.resolve.alias["solid-js$"], "solid-js/dist/dev.js");

        let prod = config(Mode::Production, Path::new("/app"));
        assert_eq!(prod.resolve.alias["solid-js/web$"], "solid-js/web");
    }

    #[test]
    fn test_serializes_for_bundler() {
        let prod = config(Mode::Production, Path::new("/app"));
        let value = serde_json::to_value(&prod).unwrap();
        assert_eq!(value["mode"], "production");
        assert_eq!(value["optimization"]["splitChunks"]["chunks"], "all");
        assert_eq!(value["moduleRules"][0]["kind"], "image-asset");
        assert_eq!(value["plugins"][0]["plugin"], "html-shell");
        assert_eq!(value["performance"], false);
    }
}
