//! Shell-environment configuration for the Kit installer.
//!
//! - [`ShellRegistry`]: the known shell dialects and their startup files.
//! - [`QueryEngine`]: what each installed shell resolves a variable to.
//! - [`MutationEngine`]: idempotently appends export lines to startup files.
//!
//! Shells are reached through the [`ShellHost`] trait; [`SystemShellHost`]
//! is the real implementation.

mod dialect;
mod host;
mod mutation;
mod query;

pub use dialect::{
    ExportTemplate, ReadTemplate, RegistryError, ShellDialect, ShellRegistry, csh_export,
    echo_read, fish_export, posix_export, rc_export,
};
pub use host::{HostError, Invocation, ShellHost, SystemShellHost};
pub use mutation::{EnvAssignment, ExportEntry, ExportOutcome, MutationEngine, MutationReport};
pub use query::{QueryEngine, QueryResult, ShellValue, Verdict};
