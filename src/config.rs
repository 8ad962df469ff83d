use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Base URL for downloading regional OpenStreetMap snapshots.
pub const GEOFABRIK_URL: &str = "https://download.geofabrik.de";

/// Base URL for the precomputed baseline water-polygon dataset.
pub const OSMDATA_URL: &str = "https://osmdata.openstreetmap.de";

const BASELINE_DIR: &str = "water-polygons-split-4326";
const BASELINE_SHP: &str = "water_polygons.shp";
const BASELINE_ARCHIVE: &str = "water-polygons-split-4326.zip";
const CORRECTED_SHP: &str = "corrected-water-polygons.shp";
const WORKING_SHP: &str = "working-water-polygons.shp";
const TMP_SHP: &str = "tmp-water-polygons.shp";
const REGION_SHP: &str = "natural_water.shp";
const FILTERED_PBF: &str = "water.osm.pbf";
const STAGING_DIR: &str = "download";

/// Optional on-disk overrides for the pipeline configuration.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub geofabrik_url: Option<String>,
    pub osmdata_url: Option<String>,
    pub uwp: Option<PathBuf>,
    pub ogr2ogr: Option<PathBuf>,
    pub osmium: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// Everything the pipeline needs to know, resolved once at startup and passed
/// by reference into each stage. Also owns the on-disk data layout.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub geofabrik_url: String,
    pub osmdata_url: String,
    /// The polygon correction tool.
    pub uwp: PathBuf,
    /// The vector format converter.
    pub ogr2ogr: PathBuf,
    /// The tag filter.
    pub osmium: PathBuf,
}

impl Config {
    /// Resolve the effective configuration: CLI flags win over the config
    /// file, which wins over built-in defaults.
    pub fn resolve(file: FileConfig, data_dir: Option<PathBuf>, uwp: Option<PathBuf>) -> Self {
        Self {
            data_dir: data_dir
                .or(file.data_dir)
                .unwrap_or_else(|| PathBuf::from("data")),
            geofabrik_url: file
                .geofabrik_url
                .unwrap_or_else(|| GEOFABRIK_URL.to_string()),
            osmdata_url: file.osmdata_url.unwrap_or_else(|| OSMDATA_URL.to_string()),
            uwp: uwp.or(file.uwp).unwrap_or_else(|| PathBuf::from("uwp")),
            ogr2ogr: file.ogr2ogr.unwrap_or_else(|| PathBuf::from("ogr2ogr")),
            osmium: file.osmium.unwrap_or_else(|| PathBuf::from("osmium")),
        }
    }

    /// Raw per-region snapshot, as downloaded.
    pub fn raw_snapshot(&self, region: &str) -> PathBuf {
        self.data_dir.join(format!("{region}.osm.pbf"))
    }

    /// Per-region subdirectory holding the filtered snapshot and shapefile.
    pub fn region_dir(&self, region: &str) -> PathBuf {
        self.data_dir.join(region)
    }

    /// Snapshot reduced to water features only.
    pub fn filtered_snapshot(&self, region: &str) -> PathBuf {
        self.region_dir(region).join(FILTERED_PBF)
    }

    /// The region's water-feature shapefile.
    pub fn region_shapefile(&self, region: &str) -> PathBuf {
        self.region_dir(region).join(REGION_SHP)
    }

    pub fn baseline_dir(&self) -> PathBuf {
        self.data_dir.join(BASELINE_DIR)
    }

    /// The baseline global water-polygon shapefile.
    pub fn baseline_shapefile(&self) -> PathBuf {
        self.baseline_dir().join(BASELINE_SHP)
    }

    /// Staging directory for in-flight archive downloads.
    pub fn staging_dir(&self) -> PathBuf {
        self.data_dir.join(STAGING_DIR)
    }

    pub fn baseline_archive(&self) -> PathBuf {
        self.staging_dir().join(BASELINE_ARCHIVE)
    }

    pub fn baseline_url(&self) -> String {
        format!("{}/download/{}", self.osmdata_url, BASELINE_ARCHIVE)
    }

    /// The published corrected-output shapefile. Only ever written by the
    /// final move at the end of a complete correction pass.
    pub fn corrected_shapefile(&self) -> PathBuf {
        self.data_dir.join(CORRECTED_SHP)
    }

    /// Rolling accumulation set for an in-progress correction pass.
    pub fn working_shapefile(&self) -> PathBuf {
        self.data_dir.join(WORKING_SHP)
    }

    /// Transient output of one correction-tool invocation.
    pub fn tmp_shapefile(&self) -> PathBuf {
        self.data_dir.join(TMP_SHP)
    }
}
