//! @acp:module "Dispatch"
//! @acp:summary "Split a raw command line and route it to the matching script handler"
//! @acp:domain cli
//! @acp:layer handler
//!
//! `solid-scripts --max-old-space-size=4096 build --stats` runs the build
//! script with `--max-old-space-size=4096` handed to the interpreter and
//! `--stats` handed to the script.

use std::path::PathBuf;

use anyhow::Result;

use super::build::{execute_build, BuildOptions};
use super::eject::{execute_eject, EjectOptions};
use super::output::{render_usage, SCRIPTS};
use super::start::{execute_start, StartOptions};
use super::test::{execute_test, TestOptions};
use crate::config::Settings;

/// A parsed dispatcher invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The selected script, when the command line names one at all
    pub script: Option<String>,
    /// Everything before the script name
    pub node_args: Vec<String>,
    /// Everything after the script name
    pub script_args: Vec<String>,
}

impl Invocation {
    /// @acp:summary "Locate the first known script name in `args`"
    ///
    /// Without a known script the first argument is reported as the (unknown)
    /// script so the usage hint can name it.
    pub fn parse(args: &[String]) -> Self {
        match args.iter().position(|arg| SCRIPTS.contains(&arg.as_str())) {
            Some(index) => Self {
                script: Some(args[index].clone()),
                node_args: args[..index].to_vec(),
                script_args: args[index + 1..].to_vec(),
            },
            None => Self {
                script: args.first().cloned(),
                node_args: Vec::new(),
                script_args: args.iter().skip(1).cloned().collect(),
            },
        }
    }

    /// Whether the selected script is one the dispatcher can run
    pub fn is_known(&self) -> bool {
        self.script
            .as_deref()
            .is_some_and(|script| SCRIPTS.contains(&script))
    }
}

/// Flags the eject script understands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EjectFlags {
    pub yes: bool,
    pub dry_run: bool,
}

impl EjectFlags {
    /// Parse eject's own flags; anything else is returned for reporting
    pub fn parse(args: &[String]) -> (Self, Vec<String>) {
        let mut flags = Self::default();
        let mut ignored = Vec::new();
        for arg in args {
            match arg.as_str() {
                "-y" | "--yes" => flags.yes = true,
                "--dry-run" => flags.dry_run = true,
                _ => ignored.push(arg.clone()),
            }
        }
        (flags, ignored)
    }
}

/// @acp:summary "Run one invocation and return the process exit status"
///
/// A missing or unknown script prints the usage hint and yields 1. Launched
/// scripts yield the child's own status; abnormal exits and failed ejections
/// surface as errors for the caller's error boundary.
pub fn dispatch(invocation: Invocation, cwd: PathBuf, settings: &Settings) -> Result<i32> {
    let script = match invocation.script.as_deref() {
        Some(script) if invocation.is_known() => script,
        other => {
            print!("{}", render_usage(other));
            return Ok(1);
        }
    };
    tracing::debug!(script, node_args = ?invocation.node_args, "dispatching");

    let outcome = match script {
        "build" => execute_build(
            BuildOptions {
                cwd,
                node_args: invocation.node_args,
                script_args: invocation.script_args,
            },
            settings,
        )?,

        "start" => execute_start(
            StartOptions {
                cwd,
                node_args: invocation.node_args,
                script_args: invocation.script_args,
            },
            settings,
        )?,

        "test" => execute_test(
            TestOptions {
                cwd,
                node_args: invocation.node_args,
                script_args: invocation.script_args,
            },
            settings,
        )?,

        _ => {
            let (flags, ignored) = EjectFlags::parse(&invocation.script_args);
            if !ignored.is_empty() {
                tracing::warn!(args = ?ignored, "ignoring unknown eject arguments");
            }
            let options = EjectOptions {
                cwd,
                yes: flags.yes,
                dry_run: flags.dry_run,
            };
            execute_eject(options, settings)?;
            return Ok(0);
        }
    };

    Ok(outcome.exit_code())
}
