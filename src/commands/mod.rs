//! @acp:module "Commands"
//! @acp:summary "CLI command implementations"
//! @acp:domain cli
//! @acp:layer handler
//!
//! One submodule per dispatcher script. Handlers return `anyhow::Result`;
//! the binary maps library errors to exit codes at the top level.

pub mod build;
pub mod dispatch;
pub mod eject;
pub mod output;
pub mod start;
pub mod test;

pub use build::{execute_build, BuildOptions};
pub use dispatch::{dispatch, EjectFlags, Invocation};
pub use eject::{execute_eject, EjectOptions};
pub use output::{print_eject_report, render_error, render_unsupported_override, render_usage, SCRIPTS};
pub use start::{execute_start, StartOptions};
pub use test::{execute_test, TestOptions};
