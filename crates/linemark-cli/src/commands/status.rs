//! `linemark status` command - Display repository state.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use linemark_core::repository::DETACHED_BRANCH;
use serde::Serialize;

use super::utils;
use crate::output;

#[derive(Debug, Serialize)]
struct JsonOutput {
    root: PathBuf,
    metadata: PathBuf,
    detached: bool,
    branch: Option<String>,
    user: String,
    modified: Vec<String>,
}

/// Run the status command.
pub async fn run(config: Option<&Path>, path: Option<PathBuf>, json: bool) -> Result<()> {
    let config = utils::load_config(config)?;
    let dir = match path {
        Some(path) => path,
        None => std::env::current_dir().context("Cannot read current directory")?,
    };

    let repo = utils::open_repo(&config, &dir).await?;
    let info = repo.info();
    let modified = repo.files_changed().await;

    if json {
        let out = JsonOutput {
            root: info.root_path,
            metadata: info.metadata_path,
            detached: info.is_detached,
            branch: info.current_branch,
            user: info.user_identity,
            modified,
        };
        output::essential(&serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let branch = match info.current_branch.as_deref() {
        None => "(unknown)".to_string(),
        Some("") => "(no commits yet)".to_string(),
        Some(DETACHED_BRANCH) => "(detached HEAD)".to_string(),
        Some(name) => name.to_string(),
    };

    output::field("root", &info.root_path.display().to_string());
    output::field("metadata", &info.metadata_path.display().to_string());
    output::field("branch", &branch);
    output::field("user", &info.user_identity);
    if info.is_detached {
        output::field("layout", "separate control directory");
    }
    output::hr();

    if modified.is_empty() {
        output::info("No modified files");
    } else {
        for file in &modified {
            output::essential(file);
        }
    }
    Ok(())
}
