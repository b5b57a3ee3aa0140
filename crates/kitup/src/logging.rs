use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::fs::OpenOptions;
use std::path::Path;

/// Once the log outgrows `max_log_size`, keep only its newer half, starting
/// at a line boundary.
fn trim_log_file_if_oversized(log_path: &Path, max_log_size: u64) {
    let oversized = std::fs::metadata(log_path).is_ok_and(|m| m.len() > max_log_size);
    if !oversized {
        return;
    }
    if let Ok(contents) = std::fs::read(log_path) {
        let _ = std::fs::write(log_path, newer_half(&contents));
    }
}

fn newer_half(contents: &[u8]) -> &[u8] {
    let (_, newer) = contents.split_at(contents.len() / 2);
    match newer.iter().position(|&b| b == b'\n') {
        Some(end_of_partial_line) => &newer[end_of_partial_line + 1..],
        None => newer,
    }
}

fn file_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Log to `log_path`, and to stderr as well when `verbose` is set.
/// Logging is best effort: a log file that cannot be opened is skipped.
pub fn init_logging(log_path: &Path, verbose: bool, max_log_size: u64) {
    trim_log_file_if_oversized(log_path, max_log_size);

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("kitup")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    if verbose {
        loggers.push(TermLogger::new(
            LevelFilter::Debug,
            config.clone(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }

    match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(file) => loggers.push(WriteLogger::new(file_level(verbose), config, file)),
        Err(e) => {
            if verbose {
                eprintln!("Could not open log file {}: {e}", log_path.display());
            }
        }
    }

    if loggers.is_empty() {
        return;
    }

    let _ = CombinedLogger::init(loggers);
    log::debug!("Logging to {}", log_path.display());
}

#[cfg(test)]
mod tests {
    use super::{LevelFilter, file_level, newer_half, trim_log_file_if_oversized};

    #[test]
    fn newer_half_starts_on_a_whole_line() {
        let contents = b"[INFO] Cloning kit\n[INFO] stack build\n[WARN] tests failed\n";
        let kept = newer_half(contents);
        assert_eq!(kept, b"[WARN] tests failed\n");
    }

    #[test]
    fn newer_half_without_newline_keeps_the_tail() {
        assert_eq!(newer_half(b"abcdef"), b"def");
    }

    #[test]
    fn oversized_log_drops_the_oldest_entries() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let log_path = temp_dir.path().join("kitup.log");
        let entries = "[INFO] run 1\n[INFO] run 2\n[INFO] run 3\n[INFO] run 4\n";
        std::fs::write(&log_path, entries).expect("write log");

        trim_log_file_if_oversized(&log_path, 16);

        let trimmed = std::fs::read_to_string(&log_path).expect("read log");
        assert!(!trimmed.contains("run 1"));
        assert!(trimmed.ends_with("[INFO] run 4\n"));
        assert!(trimmed.starts_with("[INFO]"));
    }

    #[test]
    fn log_within_limit_is_untouched() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let log_path = temp_dir.path().join("kitup.log");
        std::fs::write(&log_path, "[INFO] kitup starting\n").expect("write log");

        trim_log_file_if_oversized(&log_path, 1024);

        assert_eq!(
            std::fs::read_to_string(&log_path).expect("read log"),
            "[INFO] kitup starting\n"
        );
    }

    #[test]
    fn missing_log_is_ignored() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let log_path = temp_dir.path().join("kitup.log");
        trim_log_file_if_oversized(&log_path, 0);
        assert!(!log_path.exists());
    }

    #[test]
    fn verbose_raises_file_level() {
        assert_eq!(file_level(true), LevelFilter::Debug);
        assert_eq!(file_level(false), LevelFilter::Info);
    }
}
