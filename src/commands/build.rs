//! Materialize the catalog ahead of time

use anyhow::Result;

use crate::generator::{BuildReport, Materializer};
use crate::Folio;

/// Scan, compile and write every build artifact
pub fn run(folio: &Folio) -> Result<BuildReport> {
    let start = std::time::Instant::now();

    let report = Materializer::new(folio).build()?;

    tracing::info!(
        "Built {} posts in {:.2}s",
        report.posts,
        start.elapsed().as_secs_f64()
    );

    Ok(report)
}
