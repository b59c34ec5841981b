//! `linemark moved` command - Detect a staged rename.

use std::path::Path;

use anyhow::Result;

use super::utils;
use crate::output;

/// Run the moved command.
pub async fn run(config: Option<&Path>, file: &Path) -> Result<()> {
    let config = utils::load_config(config)?;
    let mut handle = utils::open_file(&config, file, None).await?;

    match handle.has_moved().await {
        Some(new_path) => {
            output::success(&format!(
                "{} was moved",
                handle.original_relative_path().unwrap_or_default()
            ));
            output::essential(&new_path);
        }
        None => output::info("No staged rename"),
    }
    Ok(())
}
