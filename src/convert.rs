//! Per-region stage: filter the raw snapshot down to water features and
//! vectorize the result as a shapefile.

use std::fs;
use tokio::process::Command;
use tracing::info;

use crate::config::Config;
use crate::error::{Result, UpdateError};
use crate::tool;

/// Tag selectors handed to the filter: water polygons and linear waterways.
const FILTER_EXPRESSIONS: &[&str] = &["wr/natural=water", "w/waterway=riverbank"];

/// Produce the water-feature shapefile for `region`. Returns whether a
/// conversion actually ran.
///
/// No-op when the shapefile already exists. Fails with a missing-input error
/// when the raw snapshot is absent. Both external steps must exit zero;
/// either failing aborts the run (a rerun resumes cheaply through the skip
/// policy).
pub async fn convert_region(config: &Config, region: &str) -> Result<bool> {
    let output = config.region_shapefile(region);
    if output.is_file() {
        info!("{} already exists, skipping conversion", output.display());
        return Ok(false);
    }
    let raw = config.raw_snapshot(region);
    if !raw.is_file() {
        return Err(UpdateError::MissingInput(raw));
    }
    fs::create_dir_all(config.region_dir(region))?;

    // Step 1: reduce the snapshot to water features. The raw input is never
    // mutated; the filtered copy lands in the region directory.
    let filtered = config.filtered_snapshot(region);
    info!("Filtering {} down to water features", raw.display());
    let mut filter = Command::new(&config.osmium);
    filter
        .arg("tags-filter")
        .arg("--overwrite")
        .arg("-o")
        .arg(&filtered)
        .arg(&raw)
        .args(FILTER_EXPRESSIONS);
    tool::run_checked(&mut filter, "osmium").await?;

    // Step 2: vectorize polygon features only. Unclosed rings must fail the
    // conversion instead of being silently auto-closed.
    info!("Converting {} to {}", filtered.display(), output.display());
    let mut convert = Command::new(&config.ogr2ogr);
    convert
        .arg("-f")
        .arg("ESRI Shapefile")
        .arg(&output)
        .arg(&filtered)
        .arg("multipolygons")
        .arg("-where")
        .arg("natural='water'")
        .env("OGR_GEOMETRY_ACCEPT_UNCLOSED_RING", "NO");
    tool::run_checked(&mut convert, "ogr2ogr").await?;

    Ok(true)
}
