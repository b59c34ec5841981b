//! `linemark version` command - Print the backend version.

use std::path::Path;

use anyhow::{Context, Result};
use linemark_exec::BackendVersion;

use super::utils;
use crate::output;

/// Run the version command.
pub async fn run(config: Option<&Path>) -> Result<()> {
    let config = utils::load_config(config)?;
    let version = BackendVersion::detect(&utils::dispatcher(), &config.backend.program)
        .await
        .with_context(|| format!("Could not determine {} version", config.backend.program))?;

    output::essential(&format!("{} {version}", config.backend.program));
    Ok(())
}
