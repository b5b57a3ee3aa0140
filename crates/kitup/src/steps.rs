use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

use kitup_platform::{HideWindow, describe_command};
use log::{debug, info};

#[derive(Error, Debug)]
pub enum StepError {
    #[error("Failed to start {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}")]
    Failed { command: String, status: String },

    #[error("{command} timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },
}

impl StepError {
    /// The program could not be found at all, as opposed to failing.
    #[must_use]
    pub fn is_missing_program(&self) -> bool {
        matches!(self, Self::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Runs external build tools one at a time, with their output going
/// straight to the user's terminal.
#[derive(Debug, Clone)]
pub struct StepRunner {
    timeout: Duration,
}

impl StepRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run `program` with `args` in `cwd` and wait for it to succeed.
    ///
    /// # Errors
    /// Returns an error if the program cannot be started, exits
    /// unsuccessfully or outlives the configured timeout.
    pub async fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> Result<(), StepError> {
        let command = describe_command(program, args);
        info!("Running {command}");

        // Resolves `.cmd` shims such as npm and code on Windows.
        let resolved = which::which(program).unwrap_or_else(|_| PathBuf::from(program));
        debug!("{program} resolved to {}", resolved.display());

        let mut cmd = Command::new(resolved);
        cmd.args(args).kill_on_drop(true).hide_window();
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|source| StepError::Spawn {
            command: command.clone(),
            source,
        })?;

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => status.map_err(|source| StepError::Spawn {
                command: command.clone(),
                source,
            })?,
            Err(_) => {
                let _ = child.kill().await;
                return Err(StepError::Timeout {
                    command,
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        if status.success() {
            Ok(())
        } else {
            Err(StepError::Failed {
                command,
                status: status.to_string(),
            })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn runner() -> StepRunner {
        StepRunner::new(Duration::from_secs(10))
    }

    #[tokio::test]
    async fn successful_command_is_ok() {
        runner()
            .run("sh", &["-c", "true"], None)
            .await
            .expect("true should succeed");
    }

    #[tokio::test]
    async fn command_runs_in_requested_directory() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        runner()
            .run("sh", &["-c", "touch marker"], Some(temp_dir.path()))
            .await
            .expect("touch should succeed");
        assert!(temp_dir.path().join("marker").exists());
    }

    #[tokio::test]
    async fn failing_command_reports_status() {
        let error = runner()
            .run("sh", &["-c", "exit 2"], None)
            .await
            .unwrap_err();
        assert!(matches!(error, StepError::Failed { ref command, .. } if command == "sh -c \"exit 2\""));
        assert!(!error.is_missing_program());
    }

    #[tokio::test]
    async fn missing_program_is_detected() {
        let error = runner()
            .run("kitup-no-such-build-tool", &[], None)
            .await
            .unwrap_err();
        assert!(error.is_missing_program());
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let error = StepRunner::new(Duration::from_millis(100))
            .run("sh", &["-c", "sleep 5"], None)
            .await
            .unwrap_err();
        assert!(matches!(error, StepError::Timeout { .. }));
    }
}
