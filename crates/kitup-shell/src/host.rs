use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

use kitup_platform::{HideWindow, describe_command};
use log::debug;

use crate::dialect::ShellDialect;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Exited {
        program: String,
        status: String,
        stderr: String,
    },
}

/// A request to print one variable as a given shell sees it.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub shell: &'a Path,
    pub dialect: &'a ShellDialect,
    pub variable: &'a str,
    pub home: &'a Path,
}

/// The machine's installed shells.
pub trait ShellHost {
    /// Absolute path of `program`, or `None` when it is not installed.
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Standard output of the dialect's read command, without its trailing
    /// newline.
    ///
    /// # Errors
    /// Returns an error if the shell cannot be started or exits unsuccessfully.
    fn evaluate(&self, invocation: &Invocation<'_>) -> Result<String, HostError>;
}

/// Looks shells up on `PATH` and runs them as child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShellHost;

impl ShellHost for SystemShellHost {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    fn evaluate(&self, invocation: &Invocation<'_>) -> Result<String, HostError> {
        let command = invocation.dialect.read_command(invocation.variable);
        let mut args: Vec<&str> = invocation.dialect.query_args.to_vec();
        args.push(&command);

        let program = describe_command(invocation.shell, &args);
        debug!("Querying {}: {program}", invocation.dialect.name);

        // The inherited value would mask what the startup files set.
        let output = Command::new(invocation.shell)
            .args(&args)
            .env_remove(invocation.variable)
            .env("HOME", invocation.home)
            .stdin(Stdio::null())
            .hide_window()
            .output()
            .map_err(|source| HostError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(HostError::Exited {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(strip_trailing_newline(&String::from_utf8_lossy(&output.stdout)).to_string())
    }
}

pub(crate) fn strip_trailing_newline(output: &str) -> &str {
    output
        .strip_suffix("\r\n")
        .or_else(|| output.strip_suffix('\n'))
        .unwrap_or(output)
}
