//! Command dispatcher: runs external programs and shapes their output.
//!
//! Every call is independently asynchronous. The dispatcher does not queue or
//! serialize invocations; callers that mutate shared backend state (the index,
//! for instance) are responsible for ordering their own calls.

use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use crate::traits::ProcessInvoker;

/// Per-call options for [`Dispatcher`] operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Directory to run the program in. Inherits the caller's when `None`.
    pub cwd: Option<PathBuf>,
    /// Do not emit a diagnostic when the program writes to stderr.
    pub suppress_stderr: bool,
}

impl RunOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run inside `dir`.
    #[must_use]
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Suppress the stderr diagnostic when `quiet` is true.
    #[must_use]
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.suppress_stderr = quiet;
        self
    }
}

/// Shaped stdout of a command, with its stderr text carried alongside.
///
/// A non-empty `stderr` does not mean `value` is unusable; callers decide
/// whether it is worth surfacing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput<T> {
    pub value: T,
    pub stderr: String,
}

impl<T> CommandOutput<T> {
    /// Whether the command produced any stderr text.
    #[must_use]
    pub fn has_stderr(&self) -> bool {
        !self.stderr.is_empty()
    }

    /// Transform the value, keeping the stderr text.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CommandOutput<U> {
        CommandOutput {
            value: f(self.value),
            stderr: self.stderr,
        }
    }
}

/// Runs programs through a [`ProcessInvoker`] and post-processes their output.
#[derive(Debug)]
pub struct Dispatcher<I> {
    invoker: Arc<I>,
}

impl<I> Clone for Dispatcher<I> {
    fn clone(&self) -> Self {
        Self {
            invoker: Arc::clone(&self.invoker),
        }
    }
}

impl<I: ProcessInvoker> Dispatcher<I> {
    /// Create a dispatcher that owns `invoker`.
    pub fn new(invoker: I) -> Self {
        Self {
            invoker: Arc::new(invoker),
        }
    }

    /// Create a dispatcher over an already shared invoker.
    pub const fn from_shared(invoker: Arc<I>) -> Self {
        Self { invoker }
    }

    /// The underlying invoker.
    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Run a program and split its stdout into lines.
    pub async fn run_lines(
        &self,
        program: &str,
        args: &[String],
        opts: &RunOptions,
    ) -> CommandOutput<Vec<String>> {
        self.run_raw_lines(program, args, opts).await.map(|lines| {
            lines
                .into_iter()
                .map(|line| String::from_utf8_lossy(&line).into_owned())
                .collect()
        })
    }

    /// Run a program and split its stdout into undecoded byte lines.
    pub async fn run_raw_lines(
        &self,
        program: &str,
        args: &[String],
        opts: &RunOptions,
    ) -> CommandOutput<Vec<Vec<u8>>> {
        let (stdout, stderr) = self.execute(program, args, opts).await;
        CommandOutput {
            value: split_lines(&stdout).into_iter().map(<[u8]>::to_vec).collect(),
            stderr,
        }
    }

    /// Run a program and decode its stdout as JSON.
    ///
    /// Decoding failure yields `None`: there is no fallback to line output.
    pub async fn run_structured<T: DeserializeOwned>(
        &self,
        program: &str,
        args: &[String],
        opts: &RunOptions,
    ) -> CommandOutput<Option<T>> {
        let (stdout, stderr) = self.execute(program, args, opts).await;
        let value = match serde_json::from_slice(&stdout) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(cmd = %command_line(program, args), error = %e, "stdout is not valid JSON");
                None
            }
        };
        CommandOutput { value, stderr }
    }

    async fn execute(&self, program: &str, args: &[String], opts: &RunOptions) -> (Vec<u8>, String) {
        trace!(cmd = %command_line(program, args), cwd = ?opts.cwd, "running command");

        let (stdout, stderr) = match self
            .invoker
            .invoke(program, args, opts.cwd.as_deref())
            .await
        {
            Ok(output) => (
                output.stdout,
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ),
            Err(e) => (Vec::new(), e.to_string()),
        };

        if !stderr.is_empty() && !opts.suppress_stderr {
            warn!(
                cmd = %command_line(program, args),
                cwd = %opts.cwd.as_deref().map_or_else(String::new, |p| p.display().to_string()),
                stderr = %stderr.trim_end(),
                "command reported errors"
            );
        }

        (stdout, stderr)
    }
}

/// Render a program and its arguments as a single line for diagnostics.
#[must_use]
pub fn command_line(program: &str, args: &[String]) -> String {
    let mut line = String::from(program);
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Split stdout on `\n`, dropping the single empty fragment a final newline
/// leaves behind.
///
/// `""` yields no lines, `"a\n"` yields `["a"]` and `"a\n\n"` yields `["a", ""]`.
#[must_use]
pub fn split_lines(stdout: &[u8]) -> Vec<&[u8]> {
    let mut lines: Vec<&[u8]> = stdout.split(|&b| b == b'\n').collect();
    if lines.last().is_some_and(|last| last.is_empty()) {
        lines.pop();
    }
    lines
}

/// Build an owned argument list from string slices.
#[must_use]
pub fn args<S: AsRef<str>>(parts: &[S]) -> Vec<String> {
    parts.iter().map(|s| s.as_ref().to_string()).collect()
}
