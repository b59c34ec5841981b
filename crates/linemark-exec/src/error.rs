//! Error types for linemark-exec.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while spawning an external program.
///
/// These never escape the [`Dispatcher`](crate::Dispatcher): it renders them
/// into the stderr text of the returned [`CommandOutput`](crate::CommandOutput).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The program could not be found on `PATH`.
    #[error("{0}: command not found")]
    ProgramNotFound(String),

    /// The working directory does not exist.
    #[error("working directory does not exist: {0}")]
    MissingWorkingDirectory(String),

    /// Any other failure to spawn or wait on the child process.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
