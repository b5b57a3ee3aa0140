use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type ExportTemplate = fn(&str, &str) -> String;
pub type ReadTemplate = fn(&str) -> String;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Could not determine home directory")]
    HomeDirUnavailable,

    #[error("Shell dialect registered twice: {0}")]
    DuplicateDialect(&'static str),

    #[error("Unknown shell: {0}")]
    UnknownDialect(String),
}

/// One shell syntax family and the files it reads on startup.
#[derive(Debug, Clone)]
pub struct ShellDialect {
    pub name: &'static str,
    pub program: &'static str,
    /// Flags placed before the read command when the shell is queried.
    pub query_args: &'static [&'static str],
    /// Candidate startup files, all of which are kept up to date.
    pub startup_files: Vec<PathBuf>,
    pub export_template: ExportTemplate,
    pub read_template: ReadTemplate,
}

impl ShellDialect {
    #[must_use]
    pub fn export_line(&self, name: &str, value: &str) -> String {
        (self.export_template)(name, value)
    }

    #[must_use]
    pub fn read_command(&self, name: &str) -> String {
        (self.read_template)(name)
    }

    #[must_use]
    pub fn with_startup_files(mut self, startup_files: Vec<PathBuf>) -> Self {
        self.startup_files = startup_files;
        self
    }
}

pub fn posix_export(name: &str, value: &str) -> String {
    format!("export {name}={value}")
}

pub fn csh_export(name: &str, value: &str) -> String {
    format!("setenv {name} {value}")
}

pub fn rc_export(name: &str, value: &str) -> String {
    format!("{name}={value}")
}

pub fn fish_export(name: &str, value: &str) -> String {
    format!("set -x {name} {value}")
}

pub fn echo_read(name: &str) -> String {
    format!("echo ${name}")
}

#[derive(Debug, Clone)]
pub struct ShellRegistry {
    home: PathBuf,
    dialects: Vec<ShellDialect>,
}

impl ShellRegistry {
    /// The built-in dialect table for the current user.
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined.
    pub fn native() -> Result<Self, RegistryError> {
        let home = dirs::home_dir().ok_or(RegistryError::HomeDirUnavailable)?;
        Ok(Self::with_home(home))
    }

    /// The built-in dialect table rooted at an arbitrary home directory.
    /// `sh` keeps `/etc/profile`, which does not live under a home.
    #[must_use]
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let dialects = builtin_dialects(&home);
        Self { home, dialects }
    }

    /// Build a registry from a custom table.
    ///
    /// # Errors
    /// Returns an error if two dialects share a name.
    pub fn from_dialects(
        home: impl Into<PathBuf>,
        dialects: Vec<ShellDialect>,
    ) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for dialect in &dialects {
            if !seen.insert(dialect.name) {
                return Err(RegistryError::DuplicateDialect(dialect.name));
            }
        }

        Ok(Self {
            home: home.into(),
            dialects,
        })
    }

    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }

    #[must_use]
    pub fn dialects(&self) -> &[ShellDialect] {
        &self.dialects
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ShellDialect> {
        self.dialects.iter().find(|d| d.name == name)
    }

    /// Keep only the named dialects, preserving registry order.
    ///
    /// # Errors
    /// Returns an error naming the first shell that is not registered.
    pub fn retain<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self, RegistryError> {
        if let Some(unknown) = names.iter().find(|n| self.get(n.as_ref()).is_none()) {
            return Err(RegistryError::UnknownDialect(unknown.as_ref().to_string()));
        }

        self.dialects
            .retain(|d| names.iter().any(|n| n.as_ref() == d.name));
        Ok(self)
    }
}

fn builtin_dialects(home: &Path) -> Vec<ShellDialect> {
    vec![
        ShellDialect {
            name: "csh",
            program: "csh",
            query_args: &["-c"],
            startup_files: vec![home.join(".cshrc")],
            export_template: csh_export,
            read_template: echo_read,
        },
        ShellDialect {
            name: "tcsh",
            program: "tcsh",
            query_args: &["-c"],
            startup_files: vec![home.join(".tcshrc")],
            export_template: csh_export,
            read_template: echo_read,
        },
        ShellDialect {
            name: "sh",
            program: "sh",
            query_args: &["-l", "-c"],
            startup_files: vec![PathBuf::from("/etc/profile")],
            export_template: posix_export,
            read_template: echo_read,
        },
        // Login shells read the profile, interactive non-login shells the rc file.
        ShellDialect {
            name: "bash",
            program: "bash",
            query_args: &["-l", "-c"],
            startup_files: vec![home.join(".bash_profile"), home.join(".bashrc")],
            export_template: posix_export,
            read_template: echo_read,
        },
        ShellDialect {
            name: "zsh",
            program: "zsh",
            query_args: &["-c"],
            startup_files: vec![home.join(".zshenv")],
            export_template: posix_export,
            read_template: echo_read,
        },
        ShellDialect {
            name: "rc",
            program: "rc",
            query_args: &["-c"],
            startup_files: vec![home.join(".rcrc")],
            export_template: rc_export,
            read_template: echo_read,
        },
        ShellDialect {
            name: "fish",
            program: "fish",
            query_args: &["-c"],
            startup_files: vec![home.join(".config").join("fish").join("config.fish")],
            export_template: fish_export,
            read_template: echo_read,
        },
    ]
}
