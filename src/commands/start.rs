//! @acp:module "Start Command"
//! @acp:summary "Run the development server with a development bundler config"
//! @acp:domain cli
//! @acp:layer handler

use anyhow::Result;

use super::build::{run_bundler, BuildOptions};
use crate::config::Settings;
use crate::env::Mode;
use crate::runner::ProcessOutcome;

/// Options for the start command
pub type StartOptions = BuildOptions;

/// Execute the start command
pub fn execute_start(options: StartOptions, settings: &Settings) -> Result<ProcessOutcome> {
    run_bundler("start", Mode::Development, options, settings)
}
