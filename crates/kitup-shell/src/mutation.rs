use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::dialect::{ShellDialect, ShellRegistry};
use crate::host::ShellHost;
use crate::query::{QueryEngine, ShellValue};

/// A variable that should be set in every new shell session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvAssignment {
    name: String,
    value: String,
    comment: String,
}

impl EnvAssignment {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            comment: comment.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written,
    AlreadyPresent,
    /// The shell, or the directory holding its startup file, does not exist.
    SkippedNotFound,
    PermissionDenied,
    Failed {
        kind: io::ErrorKind,
        message: String,
    },
}

impl ExportOutcome {
    fn from_io_error(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::SkippedNotFound,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            kind => Self::Failed {
                kind,
                message: error.to_string(),
            },
        }
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::Failed { .. })
    }
}

impl fmt::Display for ExportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Written => write!(f, "written"),
            Self::AlreadyPresent => write!(f, "already present"),
            Self::SkippedNotFound => write!(f, "skipped (not found)"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::Failed { message, .. } => write!(f, "failed: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub dialect: &'static str,
    pub file: PathBuf,
    pub outcome: ExportOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationReport {
    pub entries: Vec<ExportEntry>,
}

impl MutationReport {
    pub fn permission_denied(&self) -> impl Iterator<Item = &ExportEntry> {
        self.entries
            .iter()
            .filter(|e| e.outcome == ExportOutcome::PermissionDenied)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ExportEntry> {
        self.entries.iter().filter(|e| e.outcome.is_failure())
    }

    pub fn written(&self) -> impl Iterator<Item = &ExportEntry> {
        self.entries
            .iter()
            .filter(|e| e.outcome == ExportOutcome::Written)
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    #[must_use]
    pub fn outcome(&self, dialect: &str, file: &Path) -> Option<&ExportOutcome> {
        self.entries
            .iter()
            .find(|e| e.dialect == dialect && e.file == file)
            .map(|e| &e.outcome)
    }
}

pub struct MutationEngine<'a, H: ShellHost> {
    registry: &'a ShellRegistry,
    query: QueryEngine<'a, H>,
}

impl<'a, H: ShellHost> MutationEngine<'a, H> {
    #[must_use]
    pub fn new(registry: &'a ShellRegistry, host: &'a H) -> Self {
        Self {
            registry,
            query: QueryEngine::new(registry, host),
        }
    }

    /// Make sure every installed shell's startup files export the
    /// assignment. Each file is handled on its own: a failure is recorded in
    /// the report and the remaining files are still processed.
    #[must_use]
    pub fn ensure_persistent_export(&self, assignment: &EnvAssignment) -> MutationReport {
        let mut report = MutationReport::default();

        for dialect in self.registry.dialects() {
            let shared = match self.query.query_dialect(dialect, assignment.name()) {
                ShellValue::NotFound => Some(ExportOutcome::SkippedNotFound),
                value if value.matches(assignment.value()) => {
                    debug!(
                        "{} already resolves {}, leaving its startup files alone",
                        dialect.name,
                        assignment.name()
                    );
                    Some(ExportOutcome::AlreadyPresent)
                }
                _ => None,
            };

            for file in &dialect.startup_files {
                let outcome = match &shared {
                    Some(outcome) => outcome.clone(),
                    None => export_to_file(dialect, file, assignment),
                };
                report.entries.push(ExportEntry {
                    dialect: dialect.name,
                    file: file.clone(),
                    outcome,
                });
            }
        }

        report
    }
}

fn export_to_file(dialect: &ShellDialect, file: &Path, assignment: &EnvAssignment) -> ExportOutcome {
    let export_line = dialect.export_line(assignment.name(), assignment.value());

    match append_export_line(file, &export_line, assignment.comment()) {
        Ok(outcome) => {
            if outcome == ExportOutcome::Written {
                info!("Added {export_line:?} to {}", file.display());
            }
            outcome
        }
        Err(e) => {
            let outcome = ExportOutcome::from_io_error(&e);
            match outcome {
                ExportOutcome::SkippedNotFound => {
                    debug!("Skipping {}: {e}", file.display());
                }
                _ => warn!(
                    "Could not update {} for {}: {e}",
                    file.display(),
                    dialect.name
                ),
            }
            outcome
        }
    }
}

/// Append `export_line` to `file` unless a line with the same text is
/// already there. Existing content is never rewritten.
fn append_export_line(file: &Path, export_line: &str, comment: &str) -> io::Result<ExportOutcome> {
    let mut handle = match OpenOptions::new().read(true).append(true).open(file) {
        Ok(handle) => handle,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            // A missing parent directory surfaces as NotFound here as well.
            let mut handle = OpenOptions::new().write(true).create_new(true).open(file)?;
            handle.write_all(new_file_block(comment, export_line).as_bytes())?;
            return Ok(ExportOutcome::Written);
        }
        Err(e) => return Err(e),
    };

    let mut raw = Vec::new();
    handle.read_to_end(&mut raw)?;
    let content = String::from_utf8_lossy(&raw);

    if contains_line(&content, export_line) {
        return Ok(ExportOutcome::AlreadyPresent);
    }

    let block = if content.trim().is_empty() {
        new_file_block(comment, export_line)
    } else {
        format!("\n{export_line}\n")
    };
    handle.write_all(block.as_bytes())?;
    Ok(ExportOutcome::Written)
}

fn new_file_block(comment: &str, export_line: &str) -> String {
    if comment.is_empty() {
        format!("\n{export_line}\n")
    } else {
        format!("\n{comment}\n{export_line}\n")
    }
}

fn contains_line(content: &str, line: &str) -> bool {
    content.lines().any(|l| l == line)
}
