//! Trait abstraction for spawning external programs.
//!
//! The `ProcessInvoker` trait is the seam between linemark and the operating
//! system, allowing for:
//! - A `tokio::process` backed implementation in production
//! - Scripted implementations for testing
//! - Alternative implementations (e.g., remote execution)

use std::path::Path;

use crate::Result;

/// Raw result of running an external program to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Everything the program wrote to standard output.
    pub stdout: Vec<u8>,
    /// Everything the program wrote to standard error.
    pub stderr: Vec<u8>,
    /// Exit code, `None` when the program was terminated by a signal.
    pub status: Option<i32>,
}

impl ProcessOutput {
    /// Whether the program exited with status zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.status, Some(0))
    }
}

/// Capability to run an external program and collect its output.
///
/// Implementations must not interpret the output; the exit status is
/// reported as-is and a non-zero exit is not an error.
pub trait ProcessInvoker: Send + Sync {
    /// Run `program` with `args`, optionally inside `cwd`, and wait for it.
    fn invoke(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> impl std::future::Future<Output = Result<ProcessOutput>> + Send;
}
