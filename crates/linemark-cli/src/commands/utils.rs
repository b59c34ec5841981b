use std::path::Path;

use anyhow::{Context, Result};
use linemark_core::{Config, FileHandle, Repository, ResolveHints};
use linemark_exec::{BackendVersion, Dispatcher, TokioInvoker};
use tracing::debug;

/// Load the config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path.map(Path::to_path_buf).or_else(Config::default_path) {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            Config::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

/// Dispatcher that spawns real processes.
pub fn dispatcher() -> Dispatcher<TokioInvoker> {
    Dispatcher::new(TokioInvoker::new())
}

/// Resolution hints carrying the configured backend's version.
///
/// An undetectable version leaves the hint empty, which resolves with the
/// current backend's arguments.
pub async fn resolve_hints(config: &Config, dispatcher: &Dispatcher<TokioInvoker>) -> ResolveHints {
    let version = BackendVersion::detect(dispatcher, &config.backend.program).await;
    debug!(program = %config.backend.program, ?version, "detected backend version");
    ResolveHints {
        version,
        ..ResolveHints::default()
    }
}

/// Resolve the repository containing `dir`.
pub async fn open_repo(config: &Config, dir: &Path) -> Result<Repository<TokioInvoker>> {
    let dispatcher = dispatcher();
    let hints = resolve_hints(config, &dispatcher).await;
    Repository::resolve(dispatcher, config.backend.clone(), dir, &hints)
        .await
        .with_context(|| format!("Not inside a repository: {}", dir.display()))
}

/// Open a file handle for `file`.
pub async fn open_file(
    config: &Config,
    file: &Path,
    encoding: Option<&str>,
) -> Result<FileHandle<TokioInvoker>> {
    let encoding = encoding.unwrap_or(&config.files.default_encoding);
    let dispatcher = dispatcher();
    let hints = resolve_hints(config, &dispatcher).await;
    FileHandle::discover(dispatcher, config.backend.clone(), file, encoding, &hints)
        .await
        .with_context(|| format!("Not inside a repository: {}", file.display()))
}
