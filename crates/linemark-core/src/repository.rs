//! Repository handle: one working tree and its control directory.
//!
//! A `Repository` is resolved once per working tree and shared (via `Arc`) by
//! every [`FileHandle`](crate::FileHandle) inside it. Branch and user identity
//! are only re-resolved through [`Repository::refresh`].

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use linemark_exec::{BackendVersion, CommandOutput, Dispatcher, ProcessInvoker, RunOptions, args};
use tracing::{debug, warn};

use crate::config::BackendConfig;

/// Branch reported when HEAD is not on a named branch.
pub const DETACHED_BRANCH: &str = "HEAD";

/// Prefix of the branch line in `status --porcelain=v2 --branch` output.
const BRANCH_PREFIX: &str = "# branch.head ";

/// Value following [`BRANCH_PREFIX`] when HEAD is detached.
const DETACHED_MARKER: &str = "(detached)";

/// Line present when the repository has no commits yet.
const INITIAL_MARKER: &str = "# branch.oid (initial)";

/// `--absolute-git-dir` first shipped in this release.
const ABSOLUTE_GIT_DIR_SINCE: (u32, u32) = (2, 13);

/// Snapshot of a repository's resolved state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    /// Absolute path to the top of the working tree.
    pub root_path: PathBuf,
    /// Absolute path to the backend's control directory.
    pub metadata_path: PathBuf,
    /// True when the control directory is not `<root>/.git`.
    pub is_detached: bool,
    /// Branch name, [`DETACHED_BRANCH`] when HEAD is detached, the empty
    /// string when the repository has no commits, `None` when unresolved.
    pub current_branch: Option<String>,
    /// Login of the acting user, empty when unknown.
    pub user_identity: String,
}

/// Optional knowledge the caller already has about a repository.
#[derive(Debug, Clone, Default)]
pub struct ResolveHints {
    /// Known working tree root.
    pub root_path: Option<PathBuf>,
    /// Known control directory.
    pub metadata_path: Option<PathBuf>,
    /// Backend version, if already detected.
    pub version: Option<BackendVersion>,
}

impl ResolveHints {
    /// Whether both paths are known, which silences resolution diagnostics.
    #[must_use]
    pub const fn has_paths(&self) -> bool {
        self.root_path.is_some() && self.metadata_path.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeadState {
    current_branch: Option<String>,
    user_identity: String,
}

/// A resolved working tree.
#[derive(Debug)]
pub struct Repository<I> {
    dispatcher: Dispatcher<I>,
    programs: BackendConfig,
    root_path: PathBuf,
    metadata_path: PathBuf,
    is_detached: bool,
    head: RwLock<HeadState>,
}

impl<I: ProcessInvoker> Repository<I> {
    /// Resolve the repository containing the directory `path`.
    ///
    /// Returns `None` when `path` is not inside a backend-managed tree.
    pub async fn resolve(
        dispatcher: Dispatcher<I>,
        programs: BackendConfig,
        path: impl AsRef<Path>,
        hints: &ResolveHints,
    ) -> Option<Self> {
        let path = path.as_ref();
        let quiet = hints.has_paths();

        let (root_path, metadata_path) =
            resolve_paths(&dispatcher, &programs.program, path, hints).await?;
        let is_detached = metadata_path != root_path.join(".git");

        let mut repo = Self {
            dispatcher,
            programs,
            root_path,
            metadata_path,
            is_detached,
            head: RwLock::new(HeadState {
                current_branch: None,
                user_identity: String::new(),
            }),
        };

        let head = repo.resolve_head(quiet).await;
        *repo.head.get_mut().unwrap_or_else(PoisonError::into_inner) = head;

        debug!(
            root = %repo.root_path.display(),
            metadata = %repo.metadata_path.display(),
            detached = repo.is_detached,
            "resolved repository"
        );
        Some(repo)
    }

    /// Re-resolve branch and user identity.
    pub async fn refresh(&self) -> RepositoryInfo {
        let head = self.resolve_head(false).await;
        *self.head.write().unwrap_or_else(PoisonError::into_inner) = head;
        self.info()
    }

    async fn resolve_head(&self, quiet: bool) -> HeadState {
        let out = self
            .run_lines(
                &["status", "--porcelain=v2", "--branch", "--untracked-files=no"],
                quiet,
            )
            .await;

        let current_branch = parse_branch(&out.value);
        if current_branch.is_none() {
            warn!(root = %self.root_path.display(), "could not resolve current branch");
        }

        let user_identity =
            find_user_identity(&self.dispatcher, &self.programs.identity_program, &self.root_path)
                .await;

        HeadState {
            current_branch,
            user_identity,
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn info(&self) -> RepositoryInfo {
        let head = self.head.read().unwrap_or_else(PoisonError::into_inner);
        RepositoryInfo {
            root_path: self.root_path.clone(),
            metadata_path: self.metadata_path.clone(),
            is_detached: self.is_detached,
            current_branch: head.current_branch.clone(),
            user_identity: head.user_identity.clone(),
        }
    }

    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    #[must_use]
    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    #[must_use]
    pub const fn is_detached(&self) -> bool {
        self.is_detached
    }

    #[must_use]
    pub fn current_branch(&self) -> Option<String> {
        self.head
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .current_branch
            .clone()
    }

    #[must_use]
    pub fn user_identity(&self) -> String {
        self.head
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .user_identity
            .clone()
    }

    /// The dispatcher shared by this repository's commands.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher<I> {
        &self.dispatcher
    }

    /// Programs this repository was resolved with.
    #[must_use]
    pub const fn programs(&self) -> &BackendConfig {
        &self.programs
    }

    /// Full backend argument list for `args`, rooted at this tree.
    ///
    /// Trees whose control directory lives elsewhere get explicit
    /// `--git-dir`/`--work-tree` arguments.
    #[must_use]
    pub fn command_args(&self, args: &[&str]) -> Vec<String> {
        let mut full = Vec::with_capacity(args.len() + 2);
        if self.is_detached {
            full.push(format!("--git-dir={}", self.metadata_path.display()));
            full.push(format!("--work-tree={}", self.root_path.display()));
        }
        full.extend(args.iter().map(ToString::to_string));
        full
    }

    fn options(&self, quiet: bool) -> RunOptions {
        RunOptions::new().cwd(&self.root_path).quiet(quiet)
    }

    /// Run a backend command in this tree and split stdout into lines.
    pub async fn run_lines(&self, args: &[&str], quiet: bool) -> CommandOutput<Vec<String>> {
        self.dispatcher
            .run_lines(&self.programs.program, &self.command_args(args), &self.options(quiet))
            .await
    }

    /// Run a backend command in this tree and keep stdout lines undecoded.
    pub async fn run_raw_lines(&self, args: &[&str], quiet: bool) -> CommandOutput<Vec<Vec<u8>>> {
        self.dispatcher
            .run_raw_lines(&self.programs.program, &self.command_args(args), &self.options(quiet))
            .await
    }

    /// Run a backend command in this tree and decode stdout as JSON.
    pub async fn run_structured<T: serde::de::DeserializeOwned>(
        &self,
        args: &[&str],
        quiet: bool,
    ) -> CommandOutput<Option<T>> {
        self.dispatcher
            .run_structured(&self.programs.program, &self.command_args(args), &self.options(quiet))
            .await
    }

    /// Run a non-backend program (hashing, identity) from this tree's root.
    pub async fn run_program(
        &self,
        program: &str,
        args: &[String],
        quiet: bool,
    ) -> CommandOutput<Vec<String>> {
        self.dispatcher
            .run_lines(program, args, &self.options(quiet))
            .await
    }

    /// Relative paths of modified files in the working tree.
    pub async fn files_changed(&self) -> Vec<String> {
        let out = self
            .run_lines(&["status", "--porcelain", "--ignore-submodules"], false)
            .await;
        parse_modified(&out.value)
    }
}

async fn resolve_paths<I: ProcessInvoker>(
    dispatcher: &Dispatcher<I>,
    program: &str,
    path: &Path,
    hints: &ResolveHints,
) -> Option<(PathBuf, PathBuf)> {
    let absolute_git_dir = hints.version.is_none_or(|v| {
        v.at_least(ABSOLUTE_GIT_DIR_SINCE.0, ABSOLUTE_GIT_DIR_SINCE.1)
    });

    let mut cmd = Vec::new();
    if let (Some(root), Some(meta)) = (&hints.root_path, &hints.metadata_path) {
        cmd.push(format!("--git-dir={}", meta.display()));
        cmd.push(format!("--work-tree={}", root.display()));
    }
    cmd.extend(args(&[
        "rev-parse",
        "--show-toplevel",
        if absolute_git_dir {
            "--absolute-git-dir"
        } else {
            "--git-dir"
        },
    ]));

    let opts = RunOptions::new().cwd(path).quiet(hints.has_paths());
    let out = dispatcher.run_lines(program, &cmd, &opts).await;

    let mut lines = out.value.iter().filter(|l| !l.is_empty());
    let root = PathBuf::from(lines.next()?);
    let meta = PathBuf::from(lines.next()?);
    let meta = if meta.is_absolute() {
        meta
    } else {
        path.join(meta)
    };
    Some((root, meta))
}

/// Query the acting user's login.
///
/// Returns the empty string, with a diagnostic, when the query yields nothing.
pub async fn find_user_identity<I: ProcessInvoker>(
    dispatcher: &Dispatcher<I>,
    program: &str,
    path: &Path,
) -> String {
    let out = dispatcher
        .run_lines(program, &args(&["-un"]), &RunOptions::new().cwd(path))
        .await;
    match out.value.first().map(|l| l.trim()) {
        Some(login) if !login.is_empty() => login.to_string(),
        _ => {
            warn!(path = %path.display(), "unable to determine user identity");
            String::new()
        }
    }
}

/// Extract the branch from `status --porcelain=v2 --branch` output.
fn parse_branch(lines: &[String]) -> Option<String> {
    let heads: Vec<&str> = lines
        .iter()
        .filter_map(|l| l.strip_prefix(BRANCH_PREFIX))
        .collect();

    if heads.iter().any(|h| h.trim() == DETACHED_MARKER) {
        return Some(DETACHED_BRANCH.to_string());
    }
    if lines.iter().any(|l| l.starts_with(INITIAL_MARKER)) {
        return Some(String::new());
    }
    heads.first().map(|h| h.trim().to_string())
}

/// Paths from `status --porcelain` lines whose status code marks a modification.
///
/// Each line is `XY <path>`, or `XY <old> -> <new>` for renames, with paths
/// quoted when they contain whitespace or special characters.
fn parse_modified(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| {
            let code = line.get(..2)?;
            let path = line.get(3..).filter(|p| !p.is_empty())?;
            let path = path.rsplit_once(" -> ").map_or(path, |(_, new)| new);
            code.contains('M').then(|| unquote_path(path))
        })
        .collect()
}

/// Undo the backend's C-style path quoting, e.g. `"my notes.txt"` or
/// `"caf\303\251.txt"`.
///
/// Paths that are not wrapped in double quotes are returned unchanged.
pub(crate) fn unquote_path(raw: &str) -> String {
    let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) else {
        return raw.to_string();
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut iter = inner.bytes().peekable();
    while let Some(b) = iter.next() {
        if b != b'\\' {
            bytes.push(b);
            continue;
        }
        match iter.next() {
            Some(b'a') => bytes.push(0x07),
            Some(b'b') => bytes.push(0x08),
            Some(b't') => bytes.push(b'\t'),
            Some(b'n') => bytes.push(b'\n'),
            Some(b'v') => bytes.push(0x0b),
            Some(b'f') => bytes.push(0x0c),
            Some(b'r') => bytes.push(b'\r'),
            Some(digit @ b'0'..=b'7') => {
                let mut value = u32::from(digit - b'0');
                for _ in 0..2 {
                    match iter.peek() {
                        Some(&next @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(next - b'0');
                            iter.next();
                        }
                        _ => break,
                    }
                }
                bytes.push(u8::try_from(value).unwrap_or(u8::MAX));
            }
            Some(other) => bytes.push(other),
            None => bytes.push(b'\\'),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
