//! @acp:module "Module Rules"
//! @acp:summary "Ordered file-processing rules for application, element and dependency code"
//! @acp:domain cli
//! @acp:layer service
//!
//! Rule order is load-bearing. The bundler picks the first rule that matches
//! a file, so every narrower pattern has to sit before the broader pattern
//! that would otherwise shadow it:
//!
//! 1. image assets
//! 2. TypeScript, element scope then general source
//! 3. JavaScript, element scope then general source
//! 4. remaining JavaScript (dependencies)
//! 5. element stylesheets
//! 6. scoped CSS/SASS modules, then global CSS/SASS
//! 7. catch-all file assets

use serde_json::{json, Value};

use super::types::{ModuleRule, ProcessingStep, RuleKind};
use crate::env::EnvironmentDescriptor;
use crate::paths::PathSet;

pub const CSS: &str = r"\.css$";
pub const CSS_MODULE: &str = r"\.module\.css$";
pub const SASS: &str = r"\.(scss|sass)$";
pub const SASS_MODULE: &str = r"\.module\.(scss|sass)$";

const TYPESCRIPT: &str = r"\.(ts|tsx)$";
const SOURCE_JAVASCRIPT: &str = r"\.(js|mjs|jsx)$";
const DEPENDENCY_JAVASCRIPT: &str = r"\.(js|mjs)$";
const BABEL_RUNTIME: &str = r"@babel(?:/|\\{1,2})runtime";

const MEDIA_NAME: &str = "static/media/[name].[hash:8].[ext]";
const INLINE_LIMIT_BYTES: u64 = 10_000;

/// Loader that registers element modules as custom elements
const COMPONENT_REGISTER: &str = "component-register-loader";
/// Production loader of the CSS extraction plugin
const EXTRACT_CSS_LOADER: &str = "extract-css-chunks-webpack-plugin/loader";

/// @acp:summary "Build the full rule sequence in precedence order"
pub fn module_rules(env: &EnvironmentDescriptor, paths: &PathSet) -> Vec<ModuleRule> {
    let mut rules = vec![image_rule()];
    rules.extend(script_rules(env, paths));
    rules.extend(style_rules(env, paths));
    rules.push(file_rule());
    rules
}

fn image_rule() -> ModuleRule {
    ModuleRule::new(
        RuleKind::ImageAsset,
        &[r"\.bmp$", r"\.gif$", r"\.jpe?g$", r"\.png$"],
    )
    .step(ProcessingStep::with_options(
        "url-loader",
        json!({ "limit": INLINE_LIMIT_BYTES, "name": MEDIA_NAME }),
    ))
}

fn script_rules(env: &EnvironmentDescriptor, paths: &PathSet) -> Vec<ModuleRule> {
    let element_ts_presets = json!([
        ["@babel/preset-env", { "targets": env.browser_targets }],
        "solid",
        "@babel/preset-typescript"
    ]);
    // Application TypeScript uses the preset's own browserslist lookup
    let source_ts_presets = json!(["@babel/preset-env", "solid", "@babel/preset-typescript"]);
    let ts_plugins = json!([
        "@babel/plugin-syntax-dynamic-import",
        "@babel/proposal-class-properties",
        "@babel/proposal-object-rest-spread"
    ]);
    let js_presets = json!([["@babel/preset-env", { "targets": env.browser_targets }], "solid"]);
    let js_plugins = json!(["@babel/plugin-syntax-dynamic-import"]);

    vec![
        ModuleRule::new(RuleKind::ElementTypeScript, &[TYPESCRIPT])
            .include(&paths.elements)
            .step(ProcessingStep::new(COMPONENT_REGISTER))
            .step(babel(env, element_ts_presets, ts_plugins.clone())),
        ModuleRule::new(RuleKind::SourceTypeScript, &[TYPESCRIPT])
            .include(&paths.source_root)
            .exclude(&paths.elements)
            .step(babel(env, source_ts_presets, ts_plugins)),
        ModuleRule::new(RuleKind::ElementJavaScript, &[SOURCE_JAVASCRIPT])
            .include(&paths.elements)
            .step(ProcessingStep::new(COMPONENT_REGISTER))
            .step(babel(env, js_presets.clone(), js_plugins.clone())),
        ModuleRule::new(RuleKind::SourceJavaScript, &[SOURCE_JAVASCRIPT])
            .include(&paths.source_root)
            .exclude(&paths.elements)
            .step(babel(env, js_presets, js_plugins)),
        dependency_rule(env),
    ]
}

fn babel(env: &EnvironmentDescriptor, presets: Value, plugins: Value) -> ProcessingStep {
    ProcessingStep::with_options(
        "babel-loader",
        json!({
            "babelrc": false,
            "configFile": false,
            "presets": presets,
            "plugins": plugins,
            "cacheDirectory": true,
            "cacheCompression": env.is_production(),
            "compact": env.is_production(),
        }),
    )
}

/// Code outside `src/`, compiled with only the standard preset
fn dependency_rule(env: &EnvironmentDescriptor) -> ModuleRule {
    ModuleRule::new(RuleKind::DependencyJavaScript, &[DEPENDENCY_JAVASCRIPT])
        .exclude_pattern(BABEL_RUNTIME)
        .step(ProcessingStep::with_options(
            "babel-loader",
            json!({
                "babelrc": false,
                "configFile": false,
                "compact": false,
                "presets": [["@babel/preset-env", { "targets": env.browser_targets }]],
                "cacheDirectory": true,
                "cacheCompression": env.is_production(),
                "sourceMaps": env.source_maps,
                "inputSourceMap": env.source_maps,
            }),
        ))
}

/// Where a stylesheet ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StyleTarget {
    /// Inlined into a custom element's shadow root as a string
    Element,
    /// Injected into or extracted from the document
    Document,
}

fn style_rules(env: &EnvironmentDescriptor, paths: &PathSet) -> Vec<ModuleRule> {
    let css_options = |modules: bool| {
        let mut options = json!({ "importLoaders": 1, "sourceMap": env.source_maps });
        if modules {
            options["modules"] = json!({ "localIdentName": "[name]__[local]___[hash:base64:5]" });
        }
        options
    };
    let sass_options = |modules: bool| {
        let mut options = css_options(modules);
        options["importLoaders"] = json!(2);
        options
    };

    vec![
        ModuleRule::new(RuleKind::ElementCss, &[CSS])
            .include(&paths.elements)
            .exclude_pattern(CSS_MODULE)
            .steps(style_chain(env, StyleTarget::Element, css_options(false), None)),
        ModuleRule::new(RuleKind::ElementSass, &[SASS])
            .include(&paths.elements)
            .exclude_pattern(SASS_MODULE)
            .steps(style_chain(
                env,
                StyleTarget::Element,
                sass_options(false),
                Some("sass-loader"),
            )),
        ModuleRule::new(RuleKind::CssModule, &[CSS_MODULE])
            .steps(style_chain(env, StyleTarget::Document, css_options(true), None)),
        ModuleRule::new(RuleKind::SassModule, &[SASS_MODULE]).steps(style_chain(
            env,
            StyleTarget::Document,
            sass_options(true),
            Some("sass-loader"),
        )),
        // CSS imports are never dead code, whatever the package claims
        ModuleRule::new(RuleKind::Css, &[CSS])
            .exclude_pattern(CSS_MODULE)
            .steps(style_chain(env, StyleTarget::Document, css_options(false), None))
            .side_effects(true),
        ModuleRule::new(RuleKind::Sass, &[SASS])
            .exclude_pattern(SASS_MODULE)
            .steps(style_chain(
                env,
                StyleTarget::Document,
                sass_options(false),
                Some("sass-loader"),
            ))
            .side_effects(true),
    ]
}

fn style_chain(
    env: &EnvironmentDescriptor,
    target: StyleTarget,
    css_options: Value,
    pre_processor: Option<&str>,
) -> Vec<ProcessingStep> {
    let mut chain = Vec::with_capacity(4);

    match target {
        StyleTarget::Element => chain.push(ProcessingStep::new("to-string-loader")),
        StyleTarget::Document if env.is_development() => {
            chain.push(ProcessingStep::new("style-loader"))
        }
        StyleTarget::Document => {
            let options = if env.uses_relative_asset_paths() {
                json!({ "publicPath": "../../" })
            } else {
                json!({})
            };
            chain.push(ProcessingStep::with_options(EXTRACT_CSS_LOADER, options));
        }
    }

    chain.push(ProcessingStep::with_options("css-loader", css_options));
    chain.push(ProcessingStep::with_options(
        "postcss-loader",
        json!({
            "postcssOptions": {
                "ident": "postcss",
                "plugins": [
                    "postcss-flexbugs-fixes",
                    ["postcss-preset-env", { "autoprefixer": { "flexbox": "no-2009" }, "stage": 3 }],
                    "postcss-normalize"
                ]
            },
            "sourceMap": env.source_maps,
        }),
    ));

    if let Some(loader) = pre_processor {
        chain.push(ProcessingStep::with_options(
            loader,
            json!({ "sourceMap": env.source_maps }),
        ));
    }

    chain
}

/// Anything no earlier rule claimed is emitted as a hashed file
fn file_rule() -> ModuleRule {
    ModuleRule::new(RuleKind::FileAsset, &[])
        .exclude_pattern(r"\.(js|mjs|jsx|ts|tsx)$")
        .exclude_pattern(r"\.html$")
        .exclude_pattern(r"\.json$")
        .step(ProcessingStep::with_options(
            "file-loader",
            json!({ "name": MEDIA_NAME }),
        ))
}
