//! `linemark blame` command - Show who last changed a line.

use std::path::Path;

use anyhow::{Result, bail};

use super::utils;
use crate::output;

/// Run the blame command.
pub async fn run(config: Option<&Path>, file: &Path, line: usize, json: bool) -> Result<()> {
    if line == 0 {
        bail!("Line numbers start at 1");
    }

    let config = utils::load_config(config)?;
    let handle = utils::open_file(&config, file, None).await?;
    let out = handle.run_blame(line).await;
    if out.has_stderr() {
        output::warn(out.stderr.trim_end());
    }

    if json {
        output::essential(&serde_json::to_string_pretty(&out.value)?);
    } else {
        output::essential(&output::blame_line(&out.value));
    }
    Ok(())
}
