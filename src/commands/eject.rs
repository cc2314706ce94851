//! @acp:module "Eject Command"
//! @acp:summary "Confirm, then copy the tool's config and scripts into the project"
//! @acp:domain cli
//! @acp:layer handler

use std::path::PathBuf;

use anyhow::{bail, Result};
use console::style;

use super::output::print_eject_report;
use crate::config::Settings;
use crate::eject::{AssumeYes, Confirmation, EjectionEngine, InteractivePrompt, ToolBundle};
use crate::paths::find_project_root;

/// Options for the eject command
#[derive(Debug, Clone)]
pub struct EjectOptions {
    /// Directory the project root is discovered from
    pub cwd: PathBuf,
    /// Skip the confirmation prompt
    pub yes: bool,
    /// Show the manifest rewrite without touching anything
    pub dry_run: bool,
}

/// Execute the eject command
pub fn execute_eject(options: EjectOptions, settings: &Settings) -> Result<()> {
    let project_root = find_project_root(&options.cwd)?;
    let engine = EjectionEngine::new(ToolBundle::locate(settings)?);

    if options.dry_run {
        let diff = engine.preview_manifest(&project_root)?;
        if diff.is_empty() {
            println!("{} package.json would not change", style("→").dim());
        } else {
            print!("{}", diff);
        }
        return Ok(());
    }

    println!(
        "{} there is no going back! Ejecting copies every config file and script into {}.\n",
        style("WARNING:").red().bold(),
        project_root.display()
    );

    let confirmation: Box<dyn Confirmation> = if options.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(InteractivePrompt)
    };

    let report = engine.eject(&project_root, confirmation.as_ref())?;
    print_eject_report(&report);

    if !report.is_complete() {
        bail!("{} eject step(s) failed", report.failures().len());
    }
    Ok(())
}
