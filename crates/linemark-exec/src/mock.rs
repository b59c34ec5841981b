//! Scripted process invoker for tests.
//!
//! Responses are keyed by program and exact argument list. Unscripted
//! invocations succeed with empty output, which is what most backends print
//! for "nothing to report".

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::traits::{ProcessInvoker, ProcessOutput};

/// A single recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    /// Whether this invocation ran `program` with `subcommand` among its arguments.
    #[must_use]
    pub fn is(&self, program: &str, subcommand: &str) -> bool {
        self.program == program && self.args.iter().any(|a| a == subcommand)
    }
}

/// Mock implementation of `ProcessInvoker` for testing.
#[derive(Debug, Default)]
pub struct MockInvoker {
    responses: Mutex<HashMap<(String, Vec<String>), ProcessOutput>>,
    missing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<Invocation>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn key(program: &str, args: &[&str]) -> (String, Vec<String>) {
    (
        program.to_string(),
        args.iter().map(ToString::to_string).collect(),
    )
}

impl MockInvoker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the output of `program args...`.
    #[must_use]
    pub fn with_output(self, program: &str, args: &[&str], stdout: &str, stderr: &str) -> Self {
        self.set_output(program, args, stdout, stderr);
        self
    }

    /// Script raw stdout bytes for `program args...`.
    #[must_use]
    pub fn with_bytes(self, program: &str, args: &[&str], stdout: &[u8]) -> Self {
        lock(&self.responses).insert(
            key(program, args),
            ProcessOutput {
                stdout: stdout.to_vec(),
                stderr: Vec::new(),
                status: Some(0),
            },
        );
        self
    }

    /// Make every invocation of `program` fail as if it were not installed.
    #[must_use]
    pub fn with_missing_program(self, program: &str) -> Self {
        lock(&self.missing).insert(program.to_string());
        self
    }

    /// Replace the scripted output of `program args...` in place.
    pub fn set_output(&self, program: &str, args: &[&str], stdout: &str, stderr: &str) {
        let status = if stderr.is_empty() { 0 } else { 1 };
        lock(&self.responses).insert(
            key(program, args),
            ProcessOutput {
                stdout: stdout.as_bytes().to_vec(),
                stderr: stderr.as_bytes().to_vec(),
                status: Some(status),
            },
        );
    }

    /// Every invocation so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Invocation> {
        lock(&self.calls).clone()
    }

    /// Number of invocations whose arguments contain `subcommand`.
    #[must_use]
    pub fn count(&self, program: &str, subcommand: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.is(program, subcommand))
            .count()
    }
}

impl ProcessInvoker for MockInvoker {
    async fn invoke(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> Result<ProcessOutput> {
        lock(&self.calls).push(Invocation {
            program: program.to_string(),
            args: args.to_vec(),
            cwd: cwd.map(Path::to_path_buf),
        });

        if lock(&self.missing).contains(program) {
            return Err(Error::ProgramNotFound(program.to_string()));
        }

        let response = lock(&self.responses)
            .get(&(program.to_string(), args.to_vec()))
            .cloned();

        Ok(response.unwrap_or(ProcessOutput {
            stdout: Vec::new(),
            stderr: Vec::new(),
            status: Some(0),
        }))
    }
}
