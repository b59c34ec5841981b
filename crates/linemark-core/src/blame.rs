//! Blame interpretation.
//!
//! The backend reports blame for a whole file as JSON: a per-line annotation
//! table plus the commits those annotations point at. This module picks out
//! one line and normalizes it into a [`BlameRecord`], falling back to the
//! "not committed yet" sentinel whenever the line has no usable history.

use chrono::DateTime;
use linemark_exec::{CommandOutput, ProcessInvoker};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::file::FileHandle;

/// Author reported for lines without history.
pub const UNCOMMITTED_AUTHOR: &str = "Not Committed Yet";

/// Contact reported for lines without history.
pub const UNCOMMITTED_CONTACT: &str = "<not.committed.yet>";

/// Annotation labels for lines that exist only in the index or work tree.
const UNCOMMITTED_LABELS: &[&str] = &["staged", "unstaged"];

/// Length of abbreviated commit ids.
const ABBREV_LEN: usize = 8;

/// Attribution of a single line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlameRecord {
    /// Full commit id, `None` for the uncommitted sentinel.
    pub commit_id: Option<String>,
    pub abbreviated_commit_id: Option<String>,
    pub author: String,
    pub author_contact: String,
    /// Author time in seconds since the Unix epoch.
    pub author_time: Option<i64>,
    pub summary: String,
    /// Line number in the commit that introduced the line.
    pub original_line_number: usize,
    /// Line number in the current file.
    pub final_line_number: usize,
    pub previous_commit_id: Option<String>,
    pub previous_path: Option<String>,
    /// Path of the file in the commit that introduced the line.
    pub path: String,
}

impl BlameRecord {
    /// The sentinel for a line with no resolvable history.
    #[must_use]
    pub fn uncommitted(path: &str, line: usize) -> Self {
        Self {
            commit_id: None,
            abbreviated_commit_id: None,
            author: UNCOMMITTED_AUTHOR.to_string(),
            author_contact: UNCOMMITTED_CONTACT.to_string(),
            author_time: None,
            summary: UNCOMMITTED_AUTHOR.to_string(),
            original_line_number: line,
            final_line_number: line,
            previous_commit_id: None,
            previous_path: None,
            path: path.to_string(),
        }
    }

    /// Whether this is the uncommitted sentinel.
    #[must_use]
    pub const fn is_uncommitted(&self) -> bool {
        self.commit_id.is_none()
    }
}

/// Whole-file blame report as emitted by `blame --json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlameReport {
    #[serde(default)]
    pub annotations: Option<Vec<Annotation>>,
    #[serde(default)]
    pub commits: Vec<CommitEntry>,
}

/// Attribution of one line in a [`BlameReport`].
#[derive(Debug, Clone, Deserialize)]
pub struct Annotation {
    /// Line in the current file (1-indexed).
    pub line: usize,
    #[serde(default)]
    pub original_line: Option<usize>,
    #[serde(default)]
    pub commit: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// A commit referenced by annotations.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitEntry {
    pub id: String,
    #[serde(default)]
    pub short_id: Option<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub email: String,
    /// `YYYY-MM-DDTHH:MM:SS±HH:MM`.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub parents: Vec<ParentEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParentEntry {
    pub id: String,
    #[serde(default)]
    pub path: Option<String>,
}

/// Pick out `line` from `report`.
///
/// `path` is the file's current relative path, used for the sentinel and
/// when the commit does not name one.
#[must_use]
pub fn interpret(report: &BlameReport, line: usize, path: &str) -> BlameRecord {
    let Some(annotations) = &report.annotations else {
        return BlameRecord::uncommitted(path, line);
    };

    let Some(annotation) = annotations.iter().find(|a| a.line == line) else {
        return BlameRecord::uncommitted(path, line);
    };
    if annotation
        .label
        .as_deref()
        .is_some_and(|label| UNCOMMITTED_LABELS.contains(&label))
    {
        return BlameRecord::uncommitted(path, line);
    }

    let Some(commit) = annotation
        .commit
        .as_deref()
        .and_then(|id| report.commits.iter().find(|c| c.id == id))
    else {
        return BlameRecord::uncommitted(path, line);
    };

    let commit_path = commit.path.clone().unwrap_or_else(|| path.to_string());
    let parent = commit.parents.first();

    BlameRecord {
        commit_id: Some(commit.id.clone()),
        abbreviated_commit_id: Some(
            commit
                .short_id
                .clone()
                .unwrap_or_else(|| commit.id.chars().take(ABBREV_LEN).collect()),
        ),
        author: commit.author.clone(),
        author_contact: format!("<{}>", commit.email),
        author_time: parse_timestamp(&commit.date),
        summary: summary(&commit.message),
        original_line_number: annotation.original_line.unwrap_or(line),
        final_line_number: line,
        previous_commit_id: parent.map(|p| p.id.clone()),
        previous_path: parent.map(|p| p.path.clone().unwrap_or_else(|| commit_path.clone())),
        path: commit_path,
    }
}

/// First line of `message` that is non-empty once trimmed.
fn summary(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Convert `YYYY-MM-DDTHH:MM:SS±HH:MM` to seconds since the Unix epoch.
///
/// The wall-clock time is read as-is and the signed offset subtracted;
/// fractional seconds are dropped.
#[must_use]
pub fn parse_timestamp(date: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(date.trim())
        .ok()
        .map(|dt| dt.timestamp())
}

impl<I: ProcessInvoker> FileHandle<I> {
    /// Attribution of `line` (1-indexed) in the current file.
    ///
    /// Files without a content hash and repositories without commits get
    /// the sentinel without querying the backend. The blame query's stderr
    /// is returned alongside the record, so a backend that rejects the
    /// query can be told apart from a line that really is uncommitted.
    pub async fn run_blame(&self, line: usize) -> CommandOutput<BlameRecord> {
        let path = self.relative_path().unwrap_or_default().to_string();

        // An empty branch name means the repository has no commits yet.
        let no_commits = self.repository().current_branch().as_deref() == Some("");
        if self.info().content_hash.is_none() || no_commits || path.is_empty() {
            return CommandOutput {
                value: BlameRecord::uncommitted(&path, line),
                stderr: String::new(),
            };
        }

        let out = self
            .repository()
            .run_structured::<BlameReport>(&["blame", "--json", "--", &path], true)
            .await;

        out.map(|report| match report {
            Some(report) => interpret(&report, line, &path),
            None => {
                debug!(path = %path, "no usable blame report");
                BlameRecord::uncommitted(&path, line)
            }
        })
    }
}
