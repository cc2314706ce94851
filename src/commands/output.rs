//! @acp:module "Output"
//! @acp:summary "Terminal rendering for diagnostics, eject reports and usage"
//! @acp:domain cli
//! @acp:layer presentation

use console::style;

use crate::eject::{EjectReport, StepStatus};
use crate::error::{ScriptsError, UnsupportedOverride};
use crate::VERSION;

/// Scripts the dispatcher understands, in the order they are listed
pub const SCRIPTS: &[&str] = &["build", "start", "test", "eject"];

/// @acp:summary "Usage hint printed for a missing or unknown script"
pub fn render_usage(unknown: Option<&str>) -> String {
    let mut out = String::new();
    match unknown {
        Some(script) => {
            out.push_str(&format!("Unknown script \"{}\".\n", script));
            out.push_str("Perhaps you need to update solid-scripts?\n");
        }
        None => {
            out.push_str(&format!(
                "{}{}\n",
                style("solid-scripts").cyan(),
                style(format!("@{}", VERSION)).dim()
            ));
        }
    }
    out.push_str("\nScripts:\n\n");
    for script in SCRIPTS {
        out.push_str(&format!("  {}\n", script));
    }
    out
}

/// @acp:summary "Explain rejected override keys"
///
/// `setupFilesAfterEnv` gets its own message since `src/setupTests` already
/// covers it by convention.
pub fn render_unsupported_override(err: &UnsupportedOverride) -> String {
    let key = err.kind.manifest_key();
    let mut out = String::new();

    if err.is_setup_file_override() {
        out.push_str(&format!(
            "{} We detected {} in your package.json.\n\n",
            style("✗").red(),
            style(UnsupportedOverride::SETUP_FILE_KEY).bold()
        ));
        out.push_str("Remove it from the \"jest\" configuration, and put the initialization code in ");
        out.push_str(&format!("{}.\n", style("src/setupTests.js").bold()));
        out.push_str("This file will be loaded automatically.\n");

        let others: Vec<&String> = err
            .keys
            .iter()
            .filter(|k| k.as_str() != UnsupportedOverride::SETUP_FILE_KEY)
            .collect();
        if others.is_empty() {
            return out;
        }
        out.push('\n');
        out.push_str("Other unsupported keys:\n\n");
        for other in others {
            out.push_str(&format!("  {} {}\n", style("•").red(), style(other).bold()));
        }
        return out;
    }

    out.push_str(&format!(
        "{} Out of the box, solid-scripts only supports overriding these {} keys in \"{}\":\n\n",
        style("✗").red(),
        err.kind,
        key
    ));
    for supported in &err.supported {
        out.push_str(&format!("  {} {}\n", style("•").dim(), supported));
    }
    out.push_str(&format!(
        "\nThese options in your package.json \"{}\" configuration are not currently supported:\n\n",
        key
    ));
    for rejected in &err.keys {
        out.push_str(&format!("  {} {}\n", style("•").red(), style(rejected).bold()));
    }
    out.push_str("\nIf you wish to override other options, you need to eject from the default setup.\n");
    out
}

/// @acp:summary "Human-readable message for any library error"
pub fn render_error(err: &ScriptsError) -> String {
    match err {
        ScriptsError::UnsupportedOverride(rejected) => render_unsupported_override(rejected),
        ScriptsError::ProcessFailure { outcome } => format!("{}\n", outcome),
        ScriptsError::EjectionDeclined => format!("{} Close one! Eject aborted.\n", style("→").cyan()),
        other => format!("{} {}\n", style("✗").red(), other),
    }
}

/// Print the per-step outcome of an ejection
pub fn print_eject_report(report: &EjectReport) {
    for entry in &report.steps {
        match &entry.status {
            StepStatus::Done(detail) => {
                println!("{} {} ({})", style("✓").green(), entry.step, detail)
            }
            StepStatus::Skipped(reason) => {
                println!("{} {} skipped: {}", style("→").dim(), entry.step, reason)
            }
            StepStatus::Failed(reason) => {
                println!("{} {} failed: {}", style("✗").red(), entry.step, reason)
            }
        }
    }

    if let Some(changes) = &report.manifest_changes {
        if !changes.scripts.is_empty() {
            println!("  Rewrote scripts: {}", changes.scripts.join(", "));
        }
    }

    if report.is_complete() {
        println!("\n{} Ejected successfully!", style("✓").green().bold());
    } else {
        println!(
            "\n{} Ejection finished with {} failed step(s); the project may be partially ejected.",
            style("⚠").yellow(),
            report.failures().len()
        );
    }
}
