//! File handle: one file of interest inside a repository.
//!
//! A `FileHandle` caches what the backend knows about a file (relative path,
//! mode, line endings, conflict state) alongside a hash of its live content.
//! All of it is refreshed together by [`FileHandle::update_info`].

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use linemark_exec::{CommandOutput, Dispatcher, ProcessInvoker};
use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::encoding;
use crate::repository::{Repository, ResolveHints, unquote_path};

/// Prefix of the backend's "path not known" error.
const PATHSPEC_ERROR_PREFIX: &str = "error: pathspec '";

/// Backend-derived state of a file, refreshed as a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfo {
    /// Path relative to the repository root, as the backend knows it.
    pub relative_path: Option<String>,
    /// Hash of the live file content.
    pub content_hash: Option<String>,
    /// Mode of the index entry, e.g. `100644` or `100755`.
    pub mode_bits: Option<String>,
    /// Whether the index holds unmerged stages for this path.
    pub has_conflicts: bool,
    /// Whether the stored copy uses CRLF line endings.
    pub index_has_crlf: bool,
    /// Whether the on-disk copy uses CRLF line endings.
    pub working_has_crlf: bool,
}

/// A contiguous block of changed lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// Starting line in the original file (1-indexed).
    pub old_start: u32,
    /// Number of lines in the original file.
    pub old_lines: u32,
    /// Starting line in the new file (1-indexed).
    pub new_start: u32,
    /// Number of lines in the new file.
    pub new_lines: u32,
    /// Diff body lines, each prefixed with ` `, `+` or `-`.
    pub lines: Vec<String>,
}

/// One line of `ls-files --stage --eol` output.
#[derive(Debug, Clone, PartialEq, Eq)]
struct IndexEntry {
    mode: String,
    stage: u8,
    index_eol: String,
    worktree_eol: String,
    path: String,
}

/// A file inside a [`Repository`].
#[derive(Debug)]
pub struct FileHandle<I> {
    repo: Arc<Repository<I>>,
    absolute_path: PathBuf,
    encoding: String,
    info: FileInfo,
    original_relative_path: Option<String>,
}

impl<I: ProcessInvoker> FileHandle<I> {
    /// Create a handle for `path` inside an already resolved repository and
    /// populate its info.
    pub async fn open(
        repo: Arc<Repository<I>>,
        path: impl AsRef<Path>,
        encoding: &str,
        silent: bool,
    ) -> Self {
        let absolute_path = absolutize(path.as_ref());
        let relative_path = relative_to(repo.root_path(), &absolute_path);

        let mut handle = Self {
            repo,
            absolute_path,
            encoding: encoding.to_string(),
            info: FileInfo {
                relative_path,
                ..FileInfo::default()
            },
            original_relative_path: None,
        };
        handle.update_info(true, silent).await;
        handle
    }

    /// Resolve the repository containing `path` and open a handle for it.
    ///
    /// Returns `None` when `path` is not inside a backend-managed tree.
    pub async fn discover(
        dispatcher: Dispatcher<I>,
        programs: BackendConfig,
        path: impl AsRef<Path>,
        encoding: &str,
        hints: &ResolveHints,
    ) -> Option<Self> {
        let absolute_path = absolutize(path.as_ref());
        let dir = absolute_path.parent()?;
        let repo = Repository::resolve(dispatcher, programs, dir, hints).await?;
        Some(Self::open(Arc::new(repo), absolute_path, encoding, hints.has_paths()).await)
    }

    /// The repository this file belongs to.
    #[must_use]
    pub const fn repository(&self) -> &Arc<Repository<I>> {
        &self.repo
    }

    #[must_use]
    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    #[must_use]
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Cached backend state.
    #[must_use]
    pub const fn info(&self) -> &FileInfo {
        &self.info
    }

    #[must_use]
    pub fn relative_path(&self) -> Option<&str> {
        self.info.relative_path.as_deref()
    }

    /// Path the file had before a detected rename.
    #[must_use]
    pub fn original_relative_path(&self) -> Option<&str> {
        self.original_relative_path.as_deref()
    }

    /// Path used to address the file in backend commands.
    fn lookup_path(&self) -> String {
        self.info
            .relative_path
            .clone()
            .unwrap_or_else(|| self.absolute_path.to_string_lossy().into_owned())
    }

    /// Re-read relative path (when `update_relpath`), mode, conflict state,
    /// line endings and content hash.
    ///
    /// Returns whether the content hash changed. Nothing is written back
    /// until every query has completed.
    pub async fn update_info(&mut self, update_relpath: bool, silent: bool) -> bool {
        let lookup = self.lookup_path();
        let out = self
            .repo
            .run_lines(
                &[
                    "ls-files",
                    "--stage",
                    "--eol",
                    "--full-name",
                    "--error-unmatch",
                    "--",
                    &lookup,
                ],
                silent,
            )
            .await;

        let entries: Vec<IndexEntry> = out.value.iter().filter_map(|l| parse_entry(l)).collect();
        let mut info = FileInfo::default();
        if let Some(entry) = entries.first() {
            info.relative_path = Some(entry.path.clone());
            info.mode_bits = Some(entry.mode.clone());
            info.has_conflicts = entries.iter().any(|e| e.stage != 0);
            info.index_has_crlf = entry.index_eol == "crlf";
            info.working_has_crlf = entry.worktree_eol == "crlf";
        } else {
            debug!(path = %lookup, "entry inspection failed, deriving path from stderr");
            info.relative_path = Some(relpath_from_stderr(&out.stderr).unwrap_or(lookup));
        }

        if !update_relpath && self.info.relative_path.is_some() {
            info.relative_path.clone_from(&self.info.relative_path);
        }

        info.content_hash = self.hash_contents(silent).await;

        let changed = info.content_hash != self.info.content_hash;
        self.info = info;
        changed
    }

    async fn hash_contents(&self, silent: bool) -> Option<String> {
        let program = self.repo.programs().hash_program.clone();
        let out = self
            .repo
            .run_program(
                &program,
                &[self.absolute_path.to_string_lossy().into_owned()],
                silent,
            )
            .await;
        parse_digest(out.value.first()?)
    }

    /// Content of the file at `revision`, as `revision:relative_path`.
    ///
    /// Empty without error when the relative path is unknown. Lines are
    /// normalized to UTF-8 and get a trailing `\r` when the working copy
    /// uses CRLF but the stored copy does not.
    pub async fn get_show_text(&self, revision: &str) -> CommandOutput<Vec<String>> {
        let Some(relpath) = self.relative_path() else {
            return CommandOutput::default();
        };

        let object = format!("{revision}:{relpath}");
        let out = self.repo.run_raw_lines(&["show", &object], true).await;
        let mut lines = encoding::normalize(out.value, &self.encoding);

        if !self.info.index_has_crlf && self.info.working_has_crlf {
            for line in &mut lines {
                line.push('\r');
            }
        }

        CommandOutput {
            value: lines,
            stderr: out.stderr,
        }
    }

    /// Detect a staged rename of this file.
    ///
    /// On a match the handle moves to the new path and keeps the first path it
    /// was tracked under in [`original_relative_path`](Self::original_relative_path).
    pub async fn has_moved(&mut self) -> Option<String> {
        let out = self
            .repo
            .run_lines(&["diff", "--name-status", "-C", "--cached"], false)
            .await;

        let tracked = self
            .original_relative_path
            .clone()
            .or_else(|| self.info.relative_path.clone())?;
        let new_path = find_rename(&out.value, &tracked)?;

        debug!(from = %tracked, to = %new_path, "file was moved");
        self.original_relative_path.get_or_insert(tracked);
        self.absolute_path = self.repo.root_path().join(&new_path);
        self.info.relative_path = Some(new_path.clone());
        Some(new_path)
    }

    /// Commit message of `commit`, without its trailing file list.
    pub async fn get_commit_body(&self, commit: &str) -> Vec<String> {
        let out = self
            .repo
            .run_lines(&["show", "--format=%B", "--name-only", commit], false)
            .await;
        strip_file_list(out.value)
    }

    /// Remove the file from the staged set.
    pub async fn unstage(&self) {
        let relpath = self.lookup_path();
        self.repo
            .run_lines(&["reset", "--quiet", "--", &relpath], false)
            .await;
    }

    /// Stage the whole file.
    pub async fn stage_file(&self) {
        let relpath = self.lookup_path();
        self.repo.run_lines(&["add", "--", &relpath], false).await;
    }

    /// Whether line- or hunk-level staging is available.
    #[must_use]
    pub const fn supports_partial_staging() -> bool {
        false
    }

    /// Stage a range of lines. Not supported by this backend.
    pub fn stage_lines(&self, start: u32, end: u32) {
        warn!(
            path = %self.lookup_path(),
            start,
            end,
            "staging individual lines is not supported by this backend"
        );
    }

    /// Stage (or with `invert`, unstage) hunks. Not supported by this backend.
    pub fn stage_hunks(&self, hunks: &[Hunk], invert: bool) {
        warn!(
            path = %self.lookup_path(),
            hunks = hunks.len(),
            invert,
            "staging hunks is not supported by this backend"
        );
    }
}

fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// `path` relative to `root`, `/`-separated.
///
/// Falls back to canonical paths so symlinked roots (`/tmp` on macOS, for
/// instance) still match.
fn relative_to(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).map(Path::to_path_buf).ok().or_else(|| {
        let root = root.canonicalize().ok()?;
        let parent = path.parent()?.canonicalize().ok()?;
        let rel_parent = parent.strip_prefix(&root).ok()?;
        Some(rel_parent.join(path.file_name()?))
    })?;

    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Parse `<mode> <object> <stage>\ti/<eol> w/<eol> attr/<attr>\t<path>`.
fn parse_entry(line: &str) -> Option<IndexEntry> {
    let mut fields = line.splitn(3, '\t');
    let mut stage_fields = fields.next()?.split_whitespace();
    let mut eol_fields = fields.next()?.split_whitespace();
    let path = fields.next()?;

    let mode = stage_fields.next()?.to_string();
    let _object = stage_fields.next()?;
    let stage = stage_fields.next()?.parse().ok()?;

    let index_eol = eol_fields.next()?.strip_prefix("i/")?.to_string();
    let worktree_eol = eol_fields.next()?.strip_prefix("w/")?.to_string();

    Some(IndexEntry {
        mode,
        stage,
        index_eol,
        worktree_eol,
        path: path.to_string(),
    })
}

/// Recover the path the backend complained about from its stderr.
fn relpath_from_stderr(stderr: &str) -> Option<String> {
    let rest = stderr
        .lines()
        .find_map(|l| l.strip_prefix(PATHSPEC_ERROR_PREFIX))?;
    let (path, _) = rest.split_once("' ").unwrap_or((rest.trim_end_matches('\''), ""));
    (!path.is_empty()).then(|| path.to_string())
}

/// First token of a `<digest>  <path>` line.
fn parse_digest(line: &str) -> Option<String> {
    // Digests of paths containing backslashes or newlines are escaped with
    // a leading backslash.
    let digest = line.split_whitespace().next()?.trim_start_matches('\\');
    (!digest.is_empty() && digest.chars().all(|c| c.is_ascii_hexdigit()))
        .then(|| digest.to_string())
}

/// New path from a `<status>\t<old>\t<new>` line whose old path is `tracked`.
fn find_rename(lines: &[String], tracked: &str) -> Option<String> {
    lines.iter().find_map(|line| {
        let fields: Vec<&str> = line.split('\t').collect();
        match fields.as_slice() {
            [_, old, new] if unquote_path(old) == tracked => Some(unquote_path(new)),
            _ => None,
        }
    })
}

/// Drop the contiguous block of path-like lines at the end.
fn strip_file_list(mut lines: Vec<String>) -> Vec<String> {
    while lines.last().is_some_and(|l| l.contains('/')) {
        lines.pop();
    }
    lines
}
