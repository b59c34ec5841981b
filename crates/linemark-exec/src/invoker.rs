//! Default process invoker built on `tokio::process`.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::trace;

use crate::error::{Error, Result};
use crate::traits::{ProcessInvoker, ProcessOutput};

/// Runs programs as child processes of the current one.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioInvoker;

impl TokioInvoker {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ProcessInvoker for TokioInvoker {
    async fn invoke(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> Result<ProcessOutput> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = cwd {
            if !dir.is_dir() {
                return Err(Error::MissingWorkingDirectory(dir.display().to_string()));
            }
            cmd.current_dir(dir);
        }

        trace!(program, ?args, ?cwd, "spawning process");

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ProgramNotFound(program.to_string())
            } else {
                Error::Io(e)
            }
        })?;

        Ok(ProcessOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            status: output.status.code(),
        })
    }
}
