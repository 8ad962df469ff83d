use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("required tool '{0}' was not found on the search path")]
    ToolMissing(String),

    #[error("{tool} exited with {status}")]
    ToolFailed { tool: String, status: ExitStatus },

    #[error("required input file is missing: {0}")]
    MissingInput(PathBuf),

    #[error("missing sidecar file: {0}")]
    MissingSidecar(PathBuf),

    #[error("unknown region: {0}")]
    UnknownRegion(String),
}

pub type Result<T> = std::result::Result<T, UpdateError>;
