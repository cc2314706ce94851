//! @acp:module "Paths"
//! @acp:summary "Project root discovery and the fixed set of project-relative locations"
//! @acp:domain cli
//! @acp:layer io
//!
//! Every location is resolved against the discovered project root (the
//! nearest ancestor holding a `package.json`), never against the directory
//! solid-scripts itself is installed in.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Result, ScriptsError};
use crate::manifest::MANIFEST_FILE;

/// Extensions the bundler resolves, in resolution order
pub const MODULE_FILE_EXTENSIONS: &[&str] = &[
    "web.mjs", "mjs", "web.js", "js", "web.ts", "ts", "web.tsx", "tsx", "json", "web.jsx", "jsx",
];

/// @acp:summary "Resolved project locations shared by every component"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSet {
    /// Discovered project root
    pub root: PathBuf,
    /// `package.json`
    pub manifest: PathBuf,
    /// `src/index.{js,ts,…}`
    pub entry: PathBuf,
    /// `build/`
    pub output: PathBuf,
    /// `src/setupTests.{js,ts,…}`; may not exist
    pub test_setup: PathBuf,
    /// `src/`
    pub source_root: PathBuf,
    /// `src/elements/`: sources compiled as embeddable custom elements
    pub elements: PathBuf,
    /// `public/index.html`
    pub html_template: PathBuf,
    /// `public/`
    pub public_dir: PathBuf,
    /// `node_modules/`
    pub node_modules: PathBuf,
    /// `tsconfig.json`
    pub ts_config: PathBuf,
}

impl PathSet {
    /// @acp:summary "Discover the project root from `start` and resolve all paths"
    pub fn discover<P: AsRef<Path>>(start: P) -> Result<Self> {
        let root = find_project_root(start.as_ref())?;
        Ok(Self::for_root(root))
    }

    /// Resolve all paths against a known project root
    pub fn for_root<P: Into<PathBuf>>(root: P) -> Self {
        let root = root.into();
        let source_root = root.join("src");
        Self {
            manifest: root.join(MANIFEST_FILE),
            entry: resolve_module(&source_root, "index"),
            output: root.join("build"),
            test_setup: resolve_module(&source_root, "setupTests"),
            elements: source_root.join("elements"),
            html_template: root.join("public").join("index.html"),
            public_dir: root.join("public"),
            node_modules: root.join("node_modules"),
            ts_config: root.join("tsconfig.json"),
            source_root,
            root,
        }
    }

    /// Whether the project opts into TypeScript
    pub fn uses_typescript(&self) -> bool {
        self.ts_config.exists()
    }

    /// @acp:summary "Check the files a bundler run cannot do without"
    pub fn require_entry(&self) -> Result<()> {
        let missing: Vec<PathBuf> = [&self.html_template, &self.entry]
            .into_iter()
            .filter(|p| !p.is_file())
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ScriptsError::MissingEntry { searched: missing })
        }
    }

    /// Directory the synthesized configs are written to before launch
    pub fn cache_dir(&self) -> PathBuf {
        self.node_modules.join(".cache").join("solid-scripts")
    }

    /// Express `path` relative to the project root when possible
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

/// Walk upwards from `start` to the nearest directory holding a manifest
pub fn find_project_root(start: &Path) -> Result<PathBuf> {
    let start = if start.is_absolute() {
        start.to_path_buf()
    } else {
        std::env::current_dir()?.join(start)
    };

    let found = start
        .ancestors()
        .find(|dir| dir.join(MANIFEST_FILE).is_file())
        .map(Path::to_path_buf);
    found.ok_or(ScriptsError::ProjectRootNotFound { start })
}

/// Resolve `dir/name.<ext>` using the first existing module extension
///
/// Falls back to `.js` when no candidate exists, so optional files still get
/// a stable conventional path.
pub fn resolve_module(dir: &Path, name: &str) -> PathBuf {
    MODULE_FILE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", name, ext)))
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| dir.join(format!("{}.js", name)))
}

/// Path the app is served from, always ending in `/`
///
/// `PUBLIC_URL` wins over the manifest's `homepage`; a homepage URL only
/// contributes its path component. With neither, the app is served from `/`.
pub fn served_path(public_url: Option<&str>, homepage: Option<&str>) -> String {
    let raw = match (public_url, homepage) {
        (Some(url), _) => url.to_string(),
        (None, Some(home)) => url_path(home),
        (None, None) => "/".to_string(),
    };
    ensure_trailing_slash(&raw)
}

fn url_path(url: &str) -> String {
    match url.split_once("://") {
        Some((_, rest)) => match rest.find('/') {
            Some(idx) => rest[idx..].to_string(),
            None => "/".to_string(),
        },
        // Relative homepages such as "." are kept as written
        None => url.to_string(),
    }
}

fn ensure_trailing_slash(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}
