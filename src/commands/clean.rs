//! Clean the destination directory

use anyhow::Result;
use std::fs;

use crate::Site;

/// Remove the generated output
pub fn run(site: &Site) -> Result<()> {
    site.check_destination()?;
    if site.destination_dir.exists() {
        fs::remove_dir_all(&site.destination_dir)?;
        tracing::info!("Deleted: {:?}", site.destination_dir);
    }
    Ok(())
}
