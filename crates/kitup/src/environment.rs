use kitup_shell::{
    EnvAssignment, ExportOutcome, MutationEngine, MutationReport, QueryEngine, QueryResult,
    ShellHost, ShellRegistry, ShellValue, Verdict,
};
use log::{info, warn};

use crate::notify::{Notifier, Severity};

/// One status line per startup file.
#[must_use]
pub fn export_lines(report: &MutationReport) -> Vec<(Severity, String)> {
    report
        .entries
        .iter()
        .map(|entry| {
            let severity = match entry.outcome {
                ExportOutcome::Written => Severity::Success,
                ExportOutcome::AlreadyPresent | ExportOutcome::SkippedNotFound => Severity::Info,
                ExportOutcome::PermissionDenied | ExportOutcome::Failed { .. } => {
                    Severity::Failure
                }
            };
            let line = format!(
                "{:<5} {}: {}",
                entry.dialect,
                entry.file.display(),
                entry.outcome
            );
            (severity, line)
        })
        .collect()
}

/// One line per shell with the value it resolved.
#[must_use]
pub fn query_lines(result: &QueryResult) -> Vec<(Severity, String)> {
    result
        .values
        .iter()
        .map(|(dialect, value)| {
            let severity = match value {
                ShellValue::NotFound => Severity::Info,
                v if v.matches(&result.expected) => Severity::Success,
                _ => Severity::Failure,
            };
            (severity, format!("{dialect:<5} {value}"))
        })
        .collect()
}

#[must_use]
pub fn verdict_line(result: &QueryResult) -> (Severity, String) {
    let name = &result.variable;
    match result.verdict() {
        Verdict::Confirmed => (
            Severity::Success,
            format!(
                "{name} resolves to {} in all {} installed shells",
                result.expected,
                result.available_count()
            ),
        ),
        Verdict::Mismatch => {
            let shells: Vec<_> = result.mismatches().map(|(name, _)| name).collect();
            (
                Severity::Failure,
                format!("{name} does not resolve in: {}", shells.join(", ")),
            )
        }
        Verdict::NoShellsAvailable => (
            Severity::Warning,
            format!("No supported shell is installed, so {name} could not be verified"),
        ),
    }
}

/// Print a query result and return whether it was confirmed.
pub fn report_query(notifier: &Notifier, result: &QueryResult) -> bool {
    for (severity, line) in query_lines(result) {
        notifier.notify(&line, severity);
    }
    let (severity, line) = verdict_line(result);
    notifier.notify(&line, severity);
    result.verdict() == Verdict::Confirmed
}

/// Write the assignment into every shell's startup files, then check that
/// the shells pick it up. Returns true only for a confirmed propagation.
pub fn export_and_verify<H: ShellHost>(
    registry: &ShellRegistry,
    host: &H,
    notifier: &Notifier,
    assignment: &EnvAssignment,
) -> bool {
    info!(
        "Exporting {}={} to shell startup files",
        assignment.name(),
        assignment.value()
    );
    let report = MutationEngine::new(registry, host).ensure_persistent_export(assignment);

    for (severity, line) in export_lines(&report) {
        notifier.notify(&line, severity);
    }

    if report.permission_denied().next().is_some() {
        warn!("Some startup files were not writable");
        notifier.notify(
            "Insufficient permissions for some startup files, try running with sudo.",
            Severity::Failure,
        );
    }

    let result =
        QueryEngine::new(registry, host).query_variable(assignment.name(), assignment.value());
    report_query(notifier, &result) && report.is_clean()
}

/// Print every registered shell and where it is installed.
pub fn list_shells<H: ShellHost>(registry: &ShellRegistry, host: &H, notifier: &Notifier) {
    for dialect in registry.dialects() {
        let files: Vec<_> = dialect
            .startup_files
            .iter()
            .map(|f| f.display().to_string())
            .collect();
        match host.locate(dialect.program) {
            Some(path) => notifier.notify(
                &format!(
                    "{:<5} {} ({})",
                    dialect.name,
                    path.display(),
                    files.join(", ")
                ),
                Severity::Success,
            ),
            None => notifier.notify(
                &format!("{:<5} not installed ({})", dialect.name, files.join(", ")),
                Severity::Info,
            ),
        }
    }
}
