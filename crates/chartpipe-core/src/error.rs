//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Chart directory not found: {path}")]
    ChartNotFound { path: String },

    #[error("Chart.yaml not found in {path}")]
    ChartYamlMissing { path: String },

    #[error("Invalid Chart.yaml in {path}: {message}")]
    InvalidChart { path: String, message: String },

    #[error("Chart name mismatch: directory is '{directory}' but Chart.yaml declares '{declared}'")]
    NameMismatch { directory: String, declared: String },

    #[error("Failed to parse Chart.yaml: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid version: {0}")]
    InvalidVersion(#[from] semver::Error),

    #[error("Unknown bump kind '{0}' (expected patch, minor or major)")]
    UnknownBump(String),

    #[error("No top-level version field found in {path}")]
    VersionFieldMissing { path: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
