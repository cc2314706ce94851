//! @acp:module "Runner"
//! @acp:summary "Launch the bundled scripts with a synthesized config and classify how they exit"
//! @acp:domain cli
//! @acp:layer io
//!
//! The dispatcher blocks for the whole lifetime of the child. A normal exit
//! code is passed through unchanged; death by SIGKILL (usually the OOM killer)
//! or SIGTERM gets a dedicated explanation and exit code 1.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use serde::Serialize;

use crate::config::Settings;
use crate::error::{Result, ScriptsError};

/// Variable the bundled scripts read the synthesized config location from
pub const CONFIG_ENV_VAR: &str = "SOLID_SCRIPTS_CONFIG";

const SIGKILL: i32 = 9;
const SIGTERM: i32 = 15;

/// @acp:summary "How the external bundler or test runner finished"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Exited on its own with this status code
    Exited(i32),
    /// Killed with SIGKILL, typically by the out-of-memory killer
    OutOfMemory,
    /// Killed with SIGTERM
    Terminated,
    /// Killed by some other signal
    Signaled(i32),
}

impl ProcessOutcome {
    /// Classify a raw exit: `code` when the process exited, `signal` when killed
    pub fn classify(code: Option<i32>, signal: Option<i32>) -> Self {
        match (code, signal) {
            (_, Some(SIGKILL)) => ProcessOutcome::OutOfMemory,
            (_, Some(SIGTERM)) => ProcessOutcome::Terminated,
            (_, Some(other)) => ProcessOutcome::Signaled(other),
            (Some(code), None) => ProcessOutcome::Exited(code),
            (None, None) => ProcessOutcome::Exited(1),
        }
    }

    pub fn from_status(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self::classify(status.code(), signal)
    }

    pub fn success(&self) -> bool {
        matches!(self, ProcessOutcome::Exited(0))
    }

    /// Killed by a signal rather than exiting by itself
    pub fn is_abnormal(&self) -> bool {
        !matches!(self, ProcessOutcome::Exited(_))
    }

    /// Exit code solid-scripts itself reports
    pub fn exit_code(&self) -> i32 {
        match self {
            ProcessOutcome::Exited(code) => *code,
            _ => 1,
        }
    }
}

impl fmt::Display for ProcessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessOutcome::Exited(code) => write!(f, "The process exited with code {}.", code),
            ProcessOutcome::OutOfMemory => write!(
                f,
                "The build failed because the process exited too early. \
                 This probably means the system ran out of memory or someone called \
                 `kill -9` on the process."
            ),
            ProcessOutcome::Terminated => write!(
                f,
                "The build failed because the process exited too early. \
                 Someone might have called `kill` or `killall`, or the system could \
                 be shutting down."
            ),
            ProcessOutcome::Signaled(signal) => write!(
                f,
                "The build failed because the process was killed by signal {}.",
                signal
            ),
        }
    }
}

/// @acp:summary "Everything needed to launch one bundled script"
#[derive(Debug, Clone)]
pub struct Launch {
    /// Script name under the bundle's `scripts/` directory, without extension
    pub script: String,
    /// Interpreter flags placed before the script path
    pub node_args: Vec<String>,
    /// Arguments placed after the script path
    pub script_args: Vec<String>,
    /// Value for `NODE_ENV`/`BABEL_ENV`
    pub node_env: String,
    /// Synthesized config file handed to the script
    pub config_path: PathBuf,
    /// Working directory, the project root
    pub cwd: PathBuf,
}

impl Launch {
    /// @acp:summary "Build the command line for this launch"
    pub fn command(&self, settings: &Settings, bundle_root: &Path) -> Command {
        let script_path = bundle_root
            .join("scripts")
            .join(format!("{}.js", self.script));

        let mut command = Command::new(&settings.node_binary);
        command
            .args(&self.node_args)
            .arg(script_path)
            .args(&self.script_args)
            .current_dir(&self.cwd)
            .env(CONFIG_ENV_VAR, &self.config_path)
            .env("NODE_ENV", &self.node_env)
            .env("BABEL_ENV", &self.node_env);
        command
    }

    /// @acp:summary "Run to completion with inherited stdio"
    pub fn run(&self, settings: &Settings, bundle_root: &Path) -> Result<ProcessOutcome> {
        let mut command = self.command(settings, bundle_root);
        tracing::debug!(?command, "launching");

        let status = command.status()?;
        let outcome = ProcessOutcome::from_status(status);

        if outcome.is_abnormal() {
            tracing::warn!(script = %self.script, ?outcome, "process killed");
        } else {
            tracing::debug!(script = %self.script, ?outcome, "process exited");
        }
        Ok(outcome)
    }
}

/// @acp:summary "Write a synthesized config where the bundled scripts will find it"
pub fn write_config<T: Serialize>(cache_dir: &Path, script: &str, config: &T) -> Result<PathBuf> {
    std::fs::create_dir_all(cache_dir)?;
    let path = cache_dir.join(format!("{}.config.json", script));
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    Ok(path)
}

/// Turn an abnormal outcome into an error, passing normal exits through
pub fn check_outcome(outcome: ProcessOutcome) -> Result<ProcessOutcome> {
    if outcome.is_abnormal() {
        Err(ScriptsError::ProcessFailure { outcome })
    } else {
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_classify() {
        assert_eq!(ProcessOutcome::classify(Some(0), None), ProcessOutcome::Exited(0));
        assert_eq!(ProcessOutcome::classify(Some(2), None), ProcessOutcome::Exited(2));
        assert_eq!(ProcessOutcome::classify(None, Some(9)), ProcessOutcome::OutOfMemory);
        assert_eq!(ProcessOutcome::classify(None, Some(15)), ProcessOutcome::Terminated);
        assert_eq!(ProcessOutcome::classify(None, Some(2)), ProcessOutcome::Signaled(2));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ProcessOutcome::Exited(0).exit_code(), 0);
        assert_eq!(ProcessOutcome::Exited(7).exit_code(), 7);
        assert_eq!(ProcessOutcome::OutOfMemory.exit_code(), 1);
        assert_eq!(ProcessOutcome::Terminated.exit_code(), 1);
        assert!(ProcessOutcome::Exited(0).success());
        assert!(!ProcessOutcome::Exited(3).is_abnormal());
    }

    #[test]
    fn test_distinct_messages() {
        let oom = ProcessOutcome::OutOfMemory.to_string();
        let term = ProcessOutcome::Terminated.to_string();
        assert!(oom.contains("ran out of memory"));
        assert!(term.contains("killall"));
        assert_ne!(oom, term);
    }

    #[test]
    fn test_check_outcome() {
        assert!(check_outcome(ProcessOutcome::Exited(4)).is_ok());
        assert!(matches!(
            check_outcome(ProcessOutcome::Terminated),
            Err(ScriptsError::ProcessFailure { .. })
        ));
    }

    #[test]
    fn test_command_layout() {
        let launch = Launch {
            script: "build".to_string(),
            node_args: vec!["--inspect".to_string()],
            script_args: vec!["--stats".to_string()],
            node_env: "production".to_string(),
            config_path: PathBuf::from("/app/node_modules/.cache/solid-scripts/build.config.json"),
            cwd: PathBuf::from("/app"),
        };
        let command = launch.command(&Settings::default(), Path::new("/opt/tool"));
        let args: Vec<String> = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(command.get_program(), "node");
        assert_eq!(args, vec!["--inspect", "/opt/tool/scripts/build.js", "--stats"]);
    }

    #[test]
    fn test_write_config() {
        let temp = TempDir::new().unwrap();
        let cache = temp.path().join("cache");
        let path = write_config(&cache, "test", &serde_json::json!({"a": 1})).unwrap();
        assert_eq!(path, cache.join("test.config.json"));
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["a"], 1);
    }
}
