//! Copy/move primitives that treat a shapefile and its sidecar files as one
//! logical unit.
//!
//! A shapefile is never just the `.shp`: the attribute table (`.dbf`),
//! projection (`.prj`), and index (`.shx`) share its base name and must
//! travel with it. An operation that only touches the primary file leaves
//! the set inconsistent.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Result, UpdateError};

/// Sidecar extensions, in the order they are processed.
const SIDECARS: &[&str] = &["dbf", "prj", "shx"];

/// Sidecars that tool-produced intermediate output may legitimately omit.
const OPTIONAL_SIDECARS: &[&str] = &["prj", "shx"];

/// Copy a complete shapefile set from `src` to `dst`.
///
/// Strict variant for trusted, known-complete data (the baseline dataset):
/// every member must exist at `src`. Existence is verified for the whole set
/// before any byte is copied, so a failure never leaves a partial copy that
/// could be mistaken for an authoritative `dst`.
pub fn copy_set(src: &Path, dst: &Path) -> Result<()> {
    if !src.is_file() {
        return Err(UpdateError::MissingInput(src.to_path_buf()));
    }
    for ext in SIDECARS {
        let sidecar = src.with_extension(ext);
        if !sidecar.is_file() {
            return Err(UpdateError::MissingSidecar(sidecar));
        }
    }
    fs::copy(src, dst)?;
    for ext in SIDECARS {
        fs::copy(src.with_extension(ext), dst.with_extension(ext))?;
    }
    Ok(())
}

/// Move a shapefile set from `src` to `dst`, replacing any files already
/// there.
///
/// Tolerant variant for tool-produced intermediate output: the primary file
/// and the attribute table are required, the projection and index sidecars
/// move only when present. Failure on any present member still propagates.
///
/// `src` and `dst` are expected to live in the same directory tree, so each
/// member move is a plain rename.
pub fn move_set(src: &Path, dst: &Path) -> Result<()> {
    if !src.is_file() {
        return Err(UpdateError::MissingInput(src.to_path_buf()));
    }
    let dbf = src.with_extension("dbf");
    if !dbf.is_file() {
        return Err(UpdateError::MissingSidecar(dbf));
    }
    fs::rename(src, dst)?;
    fs::rename(&dbf, dst.with_extension("dbf"))?;
    for ext in OPTIONAL_SIDECARS {
        let sidecar = src.with_extension(ext);
        if sidecar.is_file() {
            fs::rename(&sidecar, dst.with_extension(ext))?;
        }
    }
    Ok(())
}

/// Delete every present member of the shapefile set at `path`.
pub fn remove_set(path: &Path) -> Result<()> {
    remove_if_exists(path)?;
    for ext in SIDECARS {
        remove_if_exists(&path.with_extension(ext))?;
    }
    Ok(())
}

/// Remove a file, treating "already gone" as success.
pub(crate) fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}
