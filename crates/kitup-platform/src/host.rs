use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    MacOs,
    /// Linux and every other Unix-like system.
    Unix,
}

impl HostOs {
    #[must_use]
    pub fn detect() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    #[must_use]
    pub fn from_os_name(os: &str) -> Self {
        match os.to_ascii_lowercase().as_str() {
            "windows" | "win" | "win32" | "win64" => Self::Windows,
            "macos" | "darwin" => Self::MacOs,
            _ => Self::Unix,
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::MacOs => "macOS",
            Self::Unix => "Linux",
        }
    }

    #[must_use]
    pub fn is_windows(self) -> bool {
        self == Self::Windows
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InstallLayoutError {
    #[error("Could not determine home directory")]
    HomeDirUnavailable,
    #[error("APPDATA is not set")]
    AppDataUnavailable,
}

/// Where the built compiler lands and where it gets installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    /// Binary produced by `stack install`. `None` when the package manager
    /// installs the binary itself.
    pub built_binary: Option<PathBuf>,
    pub binary_target: Option<PathBuf>,
    pub std_target: PathBuf,
    /// Per-user directory for downloaded build tools (Windows only).
    pub tool_dir: Option<PathBuf>,
}

impl InstallLayout {
    /// Resolve the layout for the running machine.
    ///
    /// # Errors
    /// Returns an error when the home directory (Unix) or `%APPDATA%`
    /// (Windows) cannot be determined.
    pub fn detect(os: HostOs) -> Result<Self, InstallLayoutError> {
        if os.is_windows() {
            let app_data = std::env::var_os("APPDATA")
                .map(PathBuf::from)
                .ok_or(InstallLayoutError::AppDataUnavailable)?;
            return Ok(Self::windows(&app_data));
        }

        let home = dirs::home_dir().ok_or(InstallLayoutError::HomeDirUnavailable)?;
        Ok(Self::unix(os, &home))
    }

    #[must_use]
    pub fn unix(os: HostOs, home: &Path) -> Self {
        let (bin, lib) = match os {
            HostOs::MacOs => ("/usr/local/bin/kitc", "/usr/local/lib/kit"),
            _ => ("/usr/bin/kitc", "/usr/lib/kit"),
        };
        Self {
            built_binary: Some(home.join(".local").join("bin").join("kitc")),
            binary_target: Some(PathBuf::from(bin)),
            std_target: PathBuf::from(lib),
            tool_dir: None,
        }
    }

    #[must_use]
    pub fn windows(app_data: &Path) -> Self {
        let local_bin = app_data.join("local").join("bin");
        Self {
            built_binary: None,
            binary_target: None,
            std_target: local_bin.join("std"),
            tool_dir: Some(local_bin),
        }
    }
}
