//! Print the RSS feed

use anyhow::Result;

use crate::catalog::Catalog;
use crate::feed::render_feed;
use crate::Folio;

/// Render the feed for the configured catalog
pub fn render(folio: &Folio) -> Result<String> {
    let catalog = Catalog::load(folio)?;
    Ok(render_feed(catalog.all(), &folio.config))
}

/// Write the feed to stdout
pub fn run(folio: &Folio) -> Result<()> {
    print!("{}", render(folio)?);
    Ok(())
}
