#![forbid(unsafe_code)]
//! solid-scripts command line interface

use std::process::ExitCode;

use clap::Parser;
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use solid_scripts::commands::{dispatch, render_error, Invocation};
use solid_scripts::{ScriptsError, Settings};

#[derive(Parser)]
#[command(name = "solid-scripts")]
#[command(about = "Build, serve, test and eject Solid applications")]
#[command(version)]
struct Cli {
    /// Verbose logging on stderr
    #[arg(long)]
    verbose: bool,

    /// `[node-args…] <build|start|test|eject> [script-args…]`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// Initialize tracing on stderr so the child's stdout stays untouched
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "solid_scripts=debug"
    } else {
        "solid_scripts=warn"
    };
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::from_env();
    let invocation = Invocation::parse(&cli.args);

    // Single error boundary: every failure below surfaces here exactly once
    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| dispatch(invocation, cwd, &settings));
    match result {
        Ok(code) => exit_code(code),
        Err(err) => match err.downcast_ref::<ScriptsError>() {
            Some(scripts_error) => {
                eprint!("{}", render_error(scripts_error));
                exit_code(scripts_error.exit_code())
            }
            None => {
                eprintln!("{} {:#}", style("✗").red(), err);
                ExitCode::FAILURE
            }
        },
    }
}

/// Exit statuses outside 0..=255 collapse to a generic failure
fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map(ExitCode::from).unwrap_or(ExitCode::FAILURE)
}
