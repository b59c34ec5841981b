//! Terminal output formatting utilities.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::DateTime;
use colored::Colorize;
use linemark_core::BlameRecord;

static QUIET_MODE: AtomicBool = AtomicBool::new(false);

/// Set quiet mode globally. Call once at startup.
pub fn set_quiet(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET_MODE.load(Ordering::Relaxed)
}

/// Print a success message (suppressed in quiet mode).
pub fn success(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "✓".green(), msg);
    }
}

/// Print an error message (always prints to stderr).
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a warning message (always prints to stderr).
pub fn warn(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print an info message (suppressed in quiet mode).
pub fn info(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "→".blue(), msg);
    }
}

/// Print a `label: value` detail line (suppressed in quiet mode).
pub fn field(label: &str, value: &str) {
    if !is_quiet() {
        println!("  {:<10} {}", format!("{label}:").dimmed(), value);
    }
}

/// Print essential machine-readable output (always prints).
///
/// Use for results that should be available for piping, like file content.
pub fn essential(msg: &str) {
    println!("{msg}");
}

/// Print a horizontal line (suppressed in quiet mode).
pub fn hr() {
    if !is_quiet() {
        println!("{}", "─".repeat(50).dimmed());
    }
}

/// Colored short commit id, or a dimmed placeholder for uncommitted lines.
#[must_use]
pub fn commit_ref(record: &BlameRecord) -> String {
    record.abbreviated_commit_id.as_ref().map_or_else(
        || "00000000".dimmed().to_string(),
        |id| id.yellow().to_string(),
    )
}

/// Render epoch seconds as an RFC 3339 UTC timestamp.
#[must_use]
pub fn timestamp(epoch: Option<i64>) -> String {
    epoch
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map_or_else(|| "-".to_string(), |dt| dt.to_rfc3339())
}

/// One-line blame summary: `<commit> <author>, <time> · <summary>`.
#[must_use]
pub fn blame_line(record: &BlameRecord) -> String {
    if record.is_uncommitted() {
        return format!("{} {}", commit_ref(record), record.author.dimmed());
    }
    format!(
        "{} {}, {} · {}",
        commit_ref(record),
        record.author.bold(),
        timestamp(record.author_time),
        record.summary
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_ref_colors() {
        colored::control::set_override(true);

        let mut record = BlameRecord::uncommitted("a.txt", 1);
        assert_eq!(commit_ref(&record), "00000000".dimmed().to_string());

        record.abbreviated_commit_id = Some("abcd1234".into());
        assert_eq!(commit_ref(&record), "abcd1234".yellow().to_string());

        colored::control::set_override(false);
    }

    #[test]
    fn test_timestamp() {
        assert_eq!(timestamp(Some(1_682_928_000)), "2023-05-01T08:00:00+00:00");
        assert_eq!(timestamp(None), "-");
    }

    #[test]
    fn test_blame_line_uncommitted() {
        let line = blame_line(&BlameRecord::uncommitted("a.txt", 1));
        assert!(line.contains("Not Committed Yet"));
    }

    #[test]
    fn test_blame_line_committed() {
        let mut record = BlameRecord::uncommitted("a.txt", 1);
        record.commit_id = Some("abcd1234ffff".into());
        record.abbreviated_commit_id = Some("abcd1234".into());
        record.author = "Alice".into();
        record.author_time = Some(0);
        record.summary = "Initial import".into();

        let line = blame_line(&record);
        assert!(line.contains("abcd1234"));
        assert!(line.contains("Alice"));
        assert!(line.contains("1970-01-01T00:00:00+00:00"));
        assert!(line.contains("Initial import"));
    }

    #[test]
    fn test_quiet_mode_enabled() {
        set_quiet(true);
        assert!(is_quiet());
        set_quiet(false);
        assert!(!is_quiet());
    }
}
