use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstallerSettings {
    #[serde(default = "default_repo_url")]
    pub repo_url: String,

    /// Where the toolchain is cloned. Defaults to the data directory.
    #[serde(default)]
    pub checkout_dir: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub use_dev_branch: bool,

    #[serde(default = "default_toolchain_var")]
    pub toolchain_var: String,

    /// Restrict shell configuration to these dialects.
    #[serde(default)]
    pub shells: Vec<String>,

    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,
}

fn default_repo_url() -> String {
    "https://github.com/kitlang/kit.git".to_string()
}

fn default_true() -> bool {
    true
}

fn default_toolchain_var() -> String {
    "KIT_TOOLCHAIN_PATH".to_string()
}

fn default_command_timeout() -> u64 {
    30 * 60
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for InstallerSettings {
    fn default() -> Self {
        Self {
            repo_url: default_repo_url(),
            checkout_dir: None,
            use_dev_branch: default_true(),
            toolchain_var: default_toolchain_var(),
            shells: Vec::new(),
            command_timeout_secs: default_command_timeout(),
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
        }
    }
}

impl InstallerSettings {
    /// Load settings from `path`; a missing file yields the defaults.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
