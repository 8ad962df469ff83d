//! Unpacks the baseline water-polygon archive into the data directory.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::info;
use zip::ZipArchive;

use crate::error::Result;
use crate::shapefile::remove_if_exists;

/// Extract the baseline archive into `target_dir`.
///
/// No-op when `expected` (the baseline shapefile) is already on disk.
/// Entries are rooted at `target_dir` with the archive's top-level folder
/// stripped, so the resulting layout does not depend on how the archive was
/// packed. On success the archive is deleted, along with its staging
/// directory if that is now empty. Corrupt archives and write failures are
/// fatal and propagated.
pub fn extract_baseline(archive: &Path, target_dir: &Path, expected: &Path) -> Result<()> {
    if expected.is_file() {
        info!("{} already exists, skipping extraction", expected.display());
        return Ok(());
    }

    let file = fs::File::open(archive)?;
    let mut zip = ZipArchive::new(file)?;
    fs::create_dir_all(target_dir)?;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        let Some(relative) = entry.enclosed_name().and_then(strip_top_level) else {
            continue;
        };
        let out_path = target_dir.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
    }
    info!("Extracted baseline polygons to {}", target_dir.display());

    remove_if_exists(archive)?;
    if let Some(staging) = archive.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        if fs::read_dir(staging)?.next().is_none() {
            fs::remove_dir(staging)?;
        }
    }
    Ok(())
}

/// Drop the leading directory component of a nested entry path.
fn strip_top_level(entry: &Path) -> Option<PathBuf> {
    let mut components = entry.components();
    let first = components.next()?;
    let rest = components.as_path();
    if rest.as_os_str().is_empty() {
        // Single-component entry: the top-level folder itself, or a flat file
        match first {
            Component::Normal(name) => Some(PathBuf::from(name)),
            _ => None,
        }
    } else {
        Some(rest.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::FileOptions;
    use zip::CompressionMethod;

    fn write_archive(path: &Path, entries: &[(&str, &str)]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_extracts_nested_entries_with_top_level_folder_stripped() {
        let dir = tempdir().unwrap();
        let staging = dir.path().join("download");
        fs::create_dir_all(&staging).unwrap();
        let archive = staging.join("water-polygons-split-4326.zip");
        write_archive(
            &archive,
            &[
                ("water-polygons-split-4326/water_polygons.shp", "shp"),
                ("water-polygons-split-4326/water_polygons.dbf", "dbf"),
                ("water-polygons-split-4326/water_polygons.prj", "prj"),
                ("water-polygons-split-4326/water_polygons.shx", "shx"),
            ],
        );
        let target = dir.path().join("water-polygons-split-4326");
        let expected = target.join("water_polygons.shp");

        extract_baseline(&archive, &target, &expected).unwrap();

        assert_eq!(fs::read_to_string(&expected).unwrap(), "shp");
        assert_eq!(
            fs::read_to_string(target.join("water_polygons.dbf")).unwrap(),
            "dbf"
        );
        // The archive and its now-empty staging directory are gone
        assert!(!archive.exists());
        assert!(!staging.exists());
    }

    #[test]
    fn test_flat_archives_extract_unchanged() {
        let dir = tempdir().unwrap();
        let staging = dir.path().join("download");
        fs::create_dir_all(&staging).unwrap();
        let archive = staging.join("baseline.zip");
        write_archive(&archive, &[("water_polygons.shp", "flat")]);
        let target = dir.path().join("baseline");
        let expected = target.join("water_polygons.shp");

        extract_baseline(&archive, &target, &expected).unwrap();

        assert_eq!(fs::read_to_string(&expected).unwrap(), "flat");
    }

    #[test]
    fn test_skips_when_baseline_already_present() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("baseline.zip");
        write_archive(&archive, &[("water_polygons.shp", "new")]);
        let target = dir.path().join("baseline");
        fs::create_dir_all(&target).unwrap();
        let expected = target.join("water_polygons.shp");
        fs::write(&expected, "existing").unwrap();

        extract_baseline(&archive, &target, &expected).unwrap();

        // Nothing was touched, including the archive
        assert_eq!(fs::read_to_string(&expected).unwrap(), "existing");
        assert!(archive.exists());
    }

    #[test]
    fn test_staging_directory_survives_when_not_empty() {
        let dir = tempdir().unwrap();
        let staging = dir.path().join("download");
        fs::create_dir_all(&staging).unwrap();
        fs::write(staging.join("unrelated.zip"), "other").unwrap();
        let archive = staging.join("baseline.zip");
        write_archive(&archive, &[("b/water_polygons.shp", "shp")]);
        let target = dir.path().join("baseline");

        extract_baseline(&archive, &target, &target.join("water_polygons.shp")).unwrap();

        assert!(!archive.exists());
        assert!(staging.is_dir());
    }

    #[test]
    fn test_corrupt_archive_is_fatal() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("broken.zip");
        fs::write(&archive, "not a zip at all").unwrap();
        let target = dir.path().join("baseline");

        let result = extract_baseline(&archive, &target, &target.join("water_polygons.shp"));
        assert!(result.is_err());
    }
}
