//! `linemark show` command - Print historical file content.

use std::path::Path;

use anyhow::Result;

use super::utils;
use crate::output;

/// Run the show command.
pub async fn run(config: Option<&Path>, file: &Path, rev: &str, encoding: Option<&str>) -> Result<()> {
    let config = utils::load_config(config)?;
    let handle = utils::open_file(&config, file, encoding).await?;

    let out = handle.get_show_text(rev).await;
    if out.has_stderr() {
        output::warn(out.stderr.trim_end());
    }
    for line in &out.value {
        output::essential(line);
    }
    Ok(())
}
