//! @acp:module "Bundler Plugins"
//! @acp:summary "Mode-dependent plugin assembly"
//! @acp:domain cli
//! @acp:layer service

use serde_json::json;

use super::types::PluginSpec;
use crate::env::EnvironmentDescriptor;
use crate::paths::PathSet;

/// @acp:summary "Assemble plugins for the environment, keeping only those in scope"
pub fn plugins(env: &EnvironmentDescriptor, paths: &PathSet) -> Vec<PluginSpec> {
    let candidates = vec![
        PluginSpec::HtmlShell {
            template: paths.html_template.clone(),
            inject: true,
            minify: env.is_production().then(html_minify),
        },
        // %PUBLIC_URL% and friends inside index.html
        PluginSpec::InterpolateHtml {
            replacements: env.client.raw_map(),
        },
        PluginSpec::Define {
            definitions: env.client.stringified(),
        },
        PluginSpec::HotModuleReplacement,
        // Mistyped path casing breaks the watcher silently otherwise
        PluginSpec::CaseSensitivePaths,
        PluginSpec::WatchMissingNodeModules {
            node_modules: paths.node_modules.clone(),
        },
        PluginSpec::ExtractCssChunks {
            filename: "static/css/[name].[contenthash:8].css".to_string(),
            chunk_filename: "static/css/[name].[contenthash:8].chunk.css".to_string(),
        },
        PluginSpec::AssetManifest {
            file_name: "asset-manifest.json".to_string(),
            public_path: env.public_path.clone(),
        },
        PluginSpec::IgnoreMomentLocales,
        PluginSpec::GenerateServiceWorker {
            clients_claim: true,
            exclude: vec![r"\.map$".to_string(), r"asset-manifest\.json$".to_string()],
            navigate_fallback: format!("{}/index.html", env.public_url),
            // API calls (/_…) and files in public/ are not SPA routes
            navigate_fallback_denylist: vec!["^/_".to_string(), r"/[^/]+\.[^/]+$".to_string()],
        },
    ];

    candidates
        .into_iter()
        .filter(|plugin| plugin.scope().applies_to(env.mode))
        .collect()
}

fn html_minify() -> serde_json::Value {
    json!({
        "removeComments": true,
        "collapseWhitespace": true,
        "removeRedundantAttributes": true,
        "useShortDoctype": true,
        "removeEmptyAttributes": true,
        "removeStyleLinkTypeAttributes": true,
        "keepClosingSlash": true,
        "minifyJS": true,
        "minifyCSS": true,
        "minifyURLs": true
    })
}
