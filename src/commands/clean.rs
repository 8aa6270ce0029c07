//! Remove build artifacts

use anyhow::Result;
use std::fs;

use crate::Folio;

/// Delete the output directory
pub fn run(folio: &Folio) -> Result<()> {
    if folio.output_dir.exists() {
        fs::remove_dir_all(&folio.output_dir)?;
        tracing::info!("Deleted: {:?}", folio.output_dir);
    } else {
        tracing::debug!("Nothing to clean at {:?}", folio.output_dir);
    }

    Ok(())
}
