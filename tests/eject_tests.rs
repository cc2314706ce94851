//! Ejection integration tests
//!
//! Runs the full engine against a temporary tool installation and project.

use std::path::Path;

use serde_json::{json, Value};
use tempfile::TempDir;

use solid_scripts::{AssumeYes, EjectStep, EjectionEngine, StepStatus, ToolBundle};

struct Fixture {
    _temp: TempDir,
    tool: std::path::PathBuf,
    project: std::path::PathBuf,
}

fn write_json(path: &Path, value: &Value) {
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn fixture(tool_manifest: Value, project_manifest: Value) -> Fixture {
    let temp = TempDir::new().unwrap();
    let tool = temp.path().join("this-tool");
    let project = temp.path().join("app");

    std::fs::create_dir_all(tool.join("config").join("jest")).unwrap();
    std::fs::create_dir_all(tool.join("scripts")).unwrap();
    std::fs::create_dir_all(&project).unwrap();

    write_json(&tool.join("package.json"), &tool_manifest);
    std::fs::write(tool.join("config").join("webpack.config.js"), "module.exports = {};").unwrap();
    std::fs::write(tool.join("config").join("jest").join("cssTransform.js"), "// css").unwrap();
    for script in ["build.js", "start.js", "test.js", "eject.js", "init.js", "index.js"] {
        std::fs::write(tool.join("scripts").join(script), format!("// {}", script)).unwrap();
    }

    write_json(&project.join("package.json"), &project_manifest);

    Fixture {
        _temp: temp,
        tool,
        project,
    }
}

fn default_fixture() -> Fixture {
    fixture(
        json!({
            "name": "this-tool",
            "version": "1.0.0",
            "dependencies": {"webpack": "^4.44.0", "babel-loader": "^8.1.0"}
        }),
        json!({
            "name": "app",
            "scripts": {"build": "this-tool build", "lint": "eslint src"},
            "dependencies": {"solid-js": "^1.0.0"},
            "devDependencies": {"this-tool": "^1.0.0", "webpack": "^3.0.0"}
        }),
    )
}

fn engine(fixture: &Fixture) -> EjectionEngine {
    EjectionEngine::new(ToolBundle::open(&fixture.tool).unwrap())
}

// =============================================================================
// Manifest rewrite
// =============================================================================

mod manifest_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_eject_detaches_project_from_tool() {
        let fixture = default_fixture();
        let report = engine(&fixture).eject(&fixture.project, &AssumeYes).unwrap();
        assert!(report.is_complete(), "{:?}", report.failures());

        let manifest = read_json(&fixture.project.join("package.json"));
        let dev = manifest["devDependencies"].as_object().unwrap();

        assert!(!dev.contains_key("this-tool"));
        assert_eq!(manifest["scripts"]["build"], "node scripts/build.js");
        assert_eq!(manifest["scripts"]["lint"], "eslint src");

        // Superset of the tool's own dependencies, tool versions winning
        assert_eq!(dev["webpack"], "^4.44.0");
        assert_eq!(dev["babel-loader"], "^8.1.0");
        assert_eq!(manifest["dependencies"]["solid-js"], "^1.0.0");
        assert!(manifest.get("resolutions").is_none());

        let changes = report.manifest_changes.unwrap();
        assert_eq!(changes.scripts, vec!["build"]);
        assert!(changes.removed_tool);
    }

    #[test]
    fn test_manifest_keeps_key_order_and_indentation() {
        let fixture = default_fixture();
        engine(&fixture).eject(&fixture.project, &AssumeYes).unwrap();

        let text = std::fs::read_to_string(fixture.project.join("package.json")).unwrap();
        assert!(text.starts_with("{\n  \"name\": \"app\",\n  \"scripts\""));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn test_tool_resolutions_are_copied() {
        let fixture = fixture(
            json!({
                "name": "this-tool",
                "dependencies": {"webpack": "^4.44.0"},
                "resolutions": {"terser": "4.8.0"}
            }),
            json!({"name": "app", "dependencies": {"this-tool": "^1.0.0"}}),
        );
        engine(&fixture).eject(&fixture.project, &AssumeYes).unwrap();

        let manifest = read_json(&fixture.project.join("package.json"));
        assert_eq!(manifest["resolutions"], json!({"terser": "4.8.0"}));
        assert!(manifest["dependencies"].get("this-tool").is_none());
        assert!(manifest.get("scripts").is_none());
    }

    #[test]
    fn test_preview_leaves_project_untouched() {
        let fixture = default_fixture();
        let before = std::fs::read_to_string(fixture.project.join("package.json")).unwrap();

        let diff = engine(&fixture).preview_manifest(&fixture.project).unwrap();

        assert!(diff.contains("-    \"this-tool\": \"^1.0.0\""));
        assert!(diff.contains("+    \"build\": \"node scripts/build.js\""));
        assert_eq!(
            std::fs::read_to_string(fixture.project.join("package.json")).unwrap(),
            before
        );
        assert!(!fixture.project.join("scripts").exists());
    }
}

// =============================================================================
// Copied files
// =============================================================================

mod copy_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_and_scripts_are_materialized() {
        let fixture = default_fixture();
        engine(&fixture).eject(&fixture.project, &AssumeYes).unwrap();

        assert!(fixture.project.join("config").join("webpack.config.js").is_file());
        assert_eq!(
            std::fs::read_to_string(fixture.project.join("config").join("jest").join("cssTransform.js"))
                .unwrap(),
            "// css"
        );

        let mut scripts: Vec<String> = std::fs::read_dir(fixture.project.join("scripts"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        scripts.sort();
        assert_eq!(scripts, vec!["build.js", "start.js", "test.js"]);
    }

    #[test]
    fn test_existing_scripts_dir_is_not_an_error() {
        let fixture = default_fixture();
        std::fs::create_dir_all(fixture.project.join("scripts")).unwrap();

        let report = engine(&fixture).eject(&fixture.project, &AssumeYes).unwrap();
        assert!(report.is_complete());
        assert!(matches!(
            report.status(EjectStep::CreateScriptsDir),
            Some(StepStatus::Skipped(_))
        ));
    }

    /// Ejecting twice is assumed to overwrite rather than refuse
    #[test]
    fn test_second_eject_overwrites() {
        let fixture = default_fixture();
        let engine = engine(&fixture);
        engine.eject(&fixture.project, &AssumeYes).unwrap();
        let first = std::fs::read_to_string(fixture.project.join("package.json")).unwrap();

        std::fs::write(fixture.project.join("scripts").join("build.js"), "// edited").unwrap();
        let report = engine.eject(&fixture.project, &AssumeYes).unwrap();

        assert!(report.is_complete());
        assert_eq!(
            std::fs::read_to_string(fixture.project.join("package.json")).unwrap(),
            first
        );
        assert_eq!(
            std::fs::read_to_string(fixture.project.join("scripts").join("build.js")).unwrap(),
            "// build.js"
        );
    }
}

// =============================================================================
// Lockfile and partial failure
// =============================================================================

mod lockfile_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lockfile_entries_are_removed() {
        let fixture = default_fixture();
        write_json(
            &fixture.project.join("package-lock.json"),
            &json!({
                "name": "app",
                "lockfileVersion": 2,
                "packages": {
                    "": {"name": "app"},
                    "node_modules/this-tool": {"version": "1.0.0"},
                    "node_modules/webpack": {"version": "3.0.0"}
                },
                "dependencies": {
                    "this-tool": {"version": "1.0.0"},
                    "webpack": {"version": "3.0.0"}
                }
            }),
        );

        let report = engine(&fixture).eject(&fixture.project, &AssumeYes).unwrap();
        assert!(matches!(report.status(EjectStep::RewriteLockfile), Some(StepStatus::Done(_))));

        let lock = read_json(&fixture.project.join("package-lock.json"));
        assert!(lock["dependencies"].get("this-tool").is_none());
        assert!(lock["packages"].get("node_modules/this-tool").is_none());
        assert!(lock["packages"].get("node_modules/webpack").is_some());
    }

    #[test]
    fn test_missing_lockfile_is_skipped() {
        let fixture = default_fixture();
        let report = engine(&fixture).eject(&fixture.project, &AssumeYes).unwrap();
        assert!(matches!(
            report.status(EjectStep::RewriteLockfile),
            Some(StepStatus::Skipped(_))
        ));
        assert!(!fixture.project.join("package-lock.json").exists());
    }

    #[test]
    fn test_failed_step_does_not_stop_later_steps() {
        let fixture = default_fixture();
        std::fs::remove_dir_all(fixture.tool.join("config")).unwrap();

        let report = engine(&fixture).eject(&fixture.project, &AssumeYes).unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.failures().len(), 1);
        assert!(matches!(report.status(EjectStep::CopyConfig), Some(StepStatus::Failed(_))));
        assert!(matches!(report.status(EjectStep::CopyScripts), Some(StepStatus::Done(_))));
        assert!(matches!(report.status(EjectStep::RewriteManifest), Some(StepStatus::Done(_))));

        let manifest = read_json(&fixture.project.join("package.json"));
        assert_eq!(manifest["scripts"]["build"], "node scripts/build.js");
    }
}
