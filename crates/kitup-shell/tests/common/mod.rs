#![allow(dead_code)]

use std::path::PathBuf;

use kitup_shell::{HostError, Invocation, ShellHost};

/// Installed shells that see whatever their startup files export.
pub struct SourcingHost {
    pub installed: Vec<&'static str>,
}

impl ShellHost for SourcingHost {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.installed
            .iter()
            .any(|installed| *installed == program)
            .then(|| PathBuf::from("/bin").join(program))
    }

    fn evaluate(&self, invocation: &Invocation<'_>) -> Result<String, HostError> {
        let prefix = invocation.dialect.export_line(invocation.variable, "");
        let mut value = String::new();
        for file in &invocation.dialect.startup_files {
            let Ok(content) = std::fs::read_to_string(file) else {
                continue;
            };
            for line in content.lines() {
                if let Some(rest) = line.strip_prefix(&prefix) {
                    value = rest.to_string();
                }
            }
        }
        Ok(value)
    }
}

/// Installed shells that never pick anything up from their startup files.
pub struct BlindHost {
    pub installed: Vec<&'static str>,
}

impl ShellHost for BlindHost {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.installed
            .iter()
            .any(|installed| *installed == program)
            .then(|| PathBuf::from("/bin").join(program))
    }

    fn evaluate(&self, _invocation: &Invocation<'_>) -> Result<String, HostError> {
        Ok(String::new())
    }
}
