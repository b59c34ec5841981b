//! # linemark-exec
//!
//! Command execution layer for linemark. Runs external programs through a
//! pluggable [`ProcessInvoker`] and shapes their output into lines, byte
//! lines, or decoded JSON, always carrying stderr alongside.

mod dispatcher;
mod error;
mod invoker;
mod traits;
mod version;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use dispatcher::{CommandOutput, Dispatcher, RunOptions, args, command_line, split_lines};
pub use error::{Error, Result};
pub use invoker::TokioInvoker;
pub use traits::{ProcessInvoker, ProcessOutput};
pub use version::BackendVersion;
