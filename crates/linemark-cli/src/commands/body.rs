//! `linemark body` command - Print a commit message.

use std::path::Path;

use anyhow::Result;

use super::utils;
use crate::output;

/// Run the body command.
pub async fn run(config: Option<&Path>, file: &Path, commit: &str) -> Result<()> {
    let config = utils::load_config(config)?;
    let handle = utils::open_file(&config, file, None).await?;

    for line in handle.get_commit_body(commit).await {
        output::essential(&line);
    }
    Ok(())
}
