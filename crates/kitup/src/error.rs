use std::path::PathBuf;
use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::settings::SettingsError;
use crate::steps::StepError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Paths(#[from] kitup_platform::AppPathsError),

    #[error(transparent)]
    Layout(#[from] kitup_platform::InstallLayoutError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Registry(#[from] kitup_shell::RegistryError),

    #[error("{step} failed: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: StepError,
    },

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error("Cannot resolve checkout directory {path}: {source}")]
    CheckoutDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start the async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl AppError {
    pub fn step(step: &'static str, source: StepError) -> Self {
        Self::Step { step, source }
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;
    use crate::steps::StepError;

    #[test]
    fn step_error_names_the_step() {
        let error = AppError::step(
            "Build",
            StepError::Failed {
                command: "stack build".to_string(),
                status: "exit status: 1".to_string(),
            },
        );
        assert_eq!(
            error.to_string(),
            "Build failed: stack build exited with exit status: 1"
        );
    }

    #[test]
    fn registry_errors_pass_through() {
        let error = AppError::from(kitup_shell::RegistryError::UnknownDialect(
            "nushell".to_string(),
        ));
        assert_eq!(error.to_string(), "Unknown shell: nushell");
    }

    #[test]
    fn timeout_mentions_duration() {
        let error = AppError::step(
            "Clone",
            StepError::Timeout {
                command: "git clone".to_string(),
                seconds: 30,
            },
        );
        assert_eq!(error.to_string(), "Clone failed: git clone timed out after 30s");
    }

    #[test]
    fn checkout_error_names_the_directory() {
        let error = AppError::CheckoutDir {
            path: "kit".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no cwd"),
        };
        assert_eq!(
            error.to_string(),
            "Cannot resolve checkout directory kit: no cwd"
        );
    }
}
