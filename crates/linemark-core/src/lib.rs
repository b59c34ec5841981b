//! # linemark-core
//!
//! Version-control abstraction for editor integrations: repository and file
//! handles that cache backend state, per-line blame, and historical content
//! normalized to UTF-8.
//!
//! Every query degrades instead of failing. Paths outside a repository yield
//! `None`, unusable backend output yields empty values or the uncommitted
//! blame sentinel, and stderr text is handed back next to the parsed result.

pub mod blame;
pub mod config;
pub mod encoding;
mod error;
pub mod file;
pub mod repository;

pub use blame::{BlameRecord, BlameReport, interpret, parse_timestamp};
pub use config::{BackendConfig, Config, FilesConfig};
pub use error::{Error, Result};
pub use file::{FileHandle, FileInfo, Hunk};
pub use repository::{Repository, RepositoryInfo, ResolveHints};
