use std::fmt;

use log::{debug, warn};

use crate::dialect::{ShellDialect, ShellRegistry};
use crate::host::{Invocation, ShellHost};

/// What one shell printed for a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellValue {
    Resolved(String),
    NotFound,
    /// The shell is installed but could not be queried.
    Unreadable(String),
}

impl ShellValue {
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::NotFound)
    }

    #[must_use]
    pub fn matches(&self, expected: &str) -> bool {
        matches!(self, Self::Resolved(value) if value == expected)
    }
}

impl fmt::Display for ShellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(value) if value.is_empty() => write!(f, "(unset)"),
            Self::Resolved(value) => write!(f, "{value}"),
            Self::NotFound => write!(f, "Shell not found"),
            Self::Unreadable(reason) => write!(f, "unreadable: {reason}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every installed shell resolves the expected value.
    Confirmed,
    Mismatch,
    /// No registered shell is installed, so nothing was confirmed.
    NoShellsAvailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub variable: String,
    pub expected: String,
    pub values: Vec<(&'static str, ShellValue)>,
}

impl QueryResult {
    /// True iff every available shell resolves the expected value. Vacuously
    /// true when no shell is available; use [`QueryResult::verdict`] to tell
    /// that case apart.
    #[must_use]
    pub fn all_match(&self) -> bool {
        self.values
            .iter()
            .filter(|(_, value)| value.is_available())
            .all(|(_, value)| value.matches(&self.expected))
    }

    #[must_use]
    pub fn verdict(&self) -> Verdict {
        if self.available_count() == 0 {
            Verdict::NoShellsAvailable
        } else if self.all_match() {
            Verdict::Confirmed
        } else {
            Verdict::Mismatch
        }
    }

    #[must_use]
    pub fn available_count(&self) -> usize {
        self.values.iter().filter(|(_, v)| v.is_available()).count()
    }

    #[must_use]
    pub fn get(&self, dialect: &str) -> Option<&ShellValue> {
        self.values
            .iter()
            .find(|(name, _)| *name == dialect)
            .map(|(_, value)| value)
    }

    /// Available shells whose value differs from the expected one.
    pub fn mismatches(&self) -> impl Iterator<Item = (&'static str, &ShellValue)> {
        self.values
            .iter()
            .filter(|(_, v)| v.is_available() && !v.matches(&self.expected))
            .map(|(name, value)| (*name, value))
    }
}

pub struct QueryEngine<'a, H: ShellHost> {
    registry: &'a ShellRegistry,
    host: &'a H,
}

impl<'a, H: ShellHost> QueryEngine<'a, H> {
    #[must_use]
    pub fn new(registry: &'a ShellRegistry, host: &'a H) -> Self {
        Self { registry, host }
    }

    /// Ask every registered shell what it resolves `name` to.
    #[must_use]
    pub fn query_variable(&self, name: &str, expected: &str) -> QueryResult {
        let values = self
            .registry
            .dialects()
            .iter()
            .map(|dialect| (dialect.name, self.query_dialect(dialect, name)))
            .collect();

        QueryResult {
            variable: name.to_string(),
            expected: expected.to_string(),
            values,
        }
    }

    #[must_use]
    pub fn query_dialect(&self, dialect: &ShellDialect, name: &str) -> ShellValue {
        let Some(shell) = self.host.locate(dialect.program) else {
            debug!("{} is not installed", dialect.name);
            return ShellValue::NotFound;
        };

        let invocation = Invocation {
            shell: &shell,
            dialect,
            variable: name,
            home: self.registry.home(),
        };

        match self.host.evaluate(&invocation) {
            Ok(value) => {
                debug!("{} resolves {name} to {value:?}", dialect.name);
                ShellValue::Resolved(value)
            }
            Err(e) => {
                warn!("Could not query {name} in {}: {e}", dialect.name);
                ShellValue::Unreadable(e.to_string())
            }
        }
    }
}
