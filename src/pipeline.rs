//! Sequences the pipeline stages: prerequisite check, per-region
//! acquisition, baseline acquisition, working-directory initialization, and
//! the correction pass.
//!
//! On-disk state is the sole source of truth for resumability: every stage
//! checks for its (or a downstream stage's) output before doing any work, so
//! an interrupted run resumes at the last completed stage boundary. Running
//! two instances against the same data directory is unsupported.

use serde::Serialize;
use std::fs;
use tokio::process::Command;
use tracing::{info, warn};

use crate::catalog::{Catalog, Region};
use crate::config::Config;
use crate::convert;
use crate::error::{Result, UpdateError};
use crate::extract;
use crate::fetch;
use crate::shapefile;
use crate::tool;

/// What one invocation actually did, stage by stage.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub regions: Vec<String>,
    pub downloads: usize,
    pub downloads_skipped: usize,
    pub conversions: usize,
    pub conversions_skipped: usize,
    pub baseline_fetched: bool,
    pub corrections: usize,
    pub corrected_up_to_date: bool,
}

pub struct Pipeline<'a> {
    config: &'a Config,
    catalog: &'a Catalog,
    client: reqwest::Client,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, catalog: &'a Catalog) -> Self {
        Self {
            config,
            catalog,
            client: reqwest::Client::new(),
        }
    }

    /// Run the full pipeline over `regions` (all cataloged regions when
    /// empty). Stages execute strictly in order; each is fully complete or
    /// confirmed skippable before the next begins.
    pub async fn run(&self, regions: &[String]) -> Result<RunSummary> {
        self.check_prerequisites()?;
        let selected = self.select_regions(regions)?;

        info!("Starting water polygon update");
        fs::create_dir_all(&self.config.data_dir)?;

        let mut summary = RunSummary {
            regions: selected.iter().map(|region| region.id.clone()).collect(),
            ..RunSummary::default()
        };

        for region in &selected {
            self.download_region(region, &mut summary).await?;
            if convert::convert_region(self.config, &region.id).await? {
                summary.conversions += 1;
            } else {
                summary.conversions_skipped += 1;
            }
        }

        summary.baseline_fetched = self.acquire_baseline().await?;

        if self.corrected_is_final() {
            info!(
                "{} already exists, skipping correction pass",
                self.config.corrected_shapefile().display()
            );
            summary.corrected_up_to_date = true;
            return Ok(summary);
        }

        self.initialize_working_directory()?;
        summary.corrections = self.correction_pass(&selected).await?;
        Ok(summary)
    }

    /// The tag filter and format converter are mandatory; a bad correction
    /// tool path only warns here because the correction pass may still be
    /// skipped entirely.
    fn check_prerequisites(&self) -> Result<()> {
        for required in [&self.config.osmium, &self.config.ogr2ogr] {
            if tool::find_executable(required).is_none() {
                return Err(UpdateError::ToolMissing(required.display().to_string()));
            }
        }
        if tool::find_executable(&self.config.uwp).is_none() {
            warn!(
                "{} does not exist, the correction pass will fail",
                self.config.uwp.display()
            );
        }
        Ok(())
    }

    /// Resolve the requested ids against the catalog, preserving catalog
    /// order. An empty request selects every region.
    fn select_regions(&self, regions: &[String]) -> Result<Vec<Region>> {
        for id in regions {
            if !self.catalog.contains(id) {
                return Err(UpdateError::UnknownRegion(id.clone()));
            }
        }
        Ok(self
            .catalog
            .iter()
            .filter(|region| regions.is_empty() || regions.iter().any(|id| *id == region.id))
            .cloned()
            .collect())
    }

    /// Fetch the raw snapshot for `region` unless it, or the shapefile
    /// derived from it, already exists. Checking the downstream output too
    /// matters: a completed conversion may outlive its raw input.
    async fn download_region(&self, region: &Region, summary: &mut RunSummary) -> Result<()> {
        let raw = self.config.raw_snapshot(&region.id);
        if raw.is_file() || self.config.region_shapefile(&region.id).is_file() {
            info!("{} already exists, skipping download", raw.display());
            summary.downloads_skipped += 1;
            return Ok(());
        }
        let url = region.snapshot_url(&self.config.geofabrik_url);
        fetch::fetch(&self.client, &url, &raw).await?;
        summary.downloads += 1;
        Ok(())
    }

    /// Fetch and extract the baseline dataset once. Returns whether a
    /// download happened.
    async fn acquire_baseline(&self) -> Result<bool> {
        let baseline = self.config.baseline_shapefile();
        if baseline.is_file() {
            info!("{} already exists, skipping download", baseline.display());
            return Ok(false);
        }
        let archive = self.config.baseline_archive();
        let mut fetched = false;
        if !archive.is_file() {
            fs::create_dir_all(self.config.staging_dir())?;
            fetch::fetch(&self.client, &self.config.baseline_url(), &archive).await?;
            fetched = true;
        }
        extract::extract_baseline(&archive, &self.config.baseline_dir(), &baseline)?;
        Ok(fetched)
    }

    /// The corrected set is only ever published by the final move at the end
    /// of a complete correction pass, so its presence alone marks the
    /// terminal state. A run killed mid-pass leaves working or temporary
    /// sets behind instead, never the corrected set.
    fn corrected_is_final(&self) -> bool {
        self.config.corrected_shapefile().is_file()
    }

    /// Remove leftovers from an interrupted correction pass and seed the
    /// working set from the baseline.
    fn initialize_working_directory(&self) -> Result<()> {
        shapefile::remove_set(&self.config.tmp_shapefile())?;
        shapefile::remove_set(&self.config.working_shapefile())?;
        shapefile::copy_set(
            &self.config.baseline_shapefile(),
            &self.config.working_shapefile(),
        )
    }

    /// Apply each region's corrections in turn: the tool reads the current
    /// working set plus the region set and writes a temporary set, which
    /// then replaces the working set before the next region is processed.
    /// Only after the last region succeeds does the finished working set
    /// move to the corrected-output path.
    async fn correction_pass(&self, selected: &[Region]) -> Result<usize> {
        let working = self.config.working_shapefile();
        let tmp = self.config.tmp_shapefile();
        let mut corrections = 0;
        for region in selected {
            let region_shapefile = self.config.region_shapefile(&region.id);
            if !region_shapefile.is_file() {
                return Err(UpdateError::MissingInput(region_shapefile));
            }
            info!("Processing {}", region.id);
            let mut correct = Command::new(&self.config.uwp);
            correct.arg(&working).arg(&region_shapefile).arg(&tmp);
            tool::run_checked(&mut correct, "uwp").await?;
            shapefile::move_set(&tmp, &working)?;
            corrections += 1;
        }
        shapefile::move_set(&working, &self.config.corrected_shapefile())?;
        Ok(corrections)
    }
}
