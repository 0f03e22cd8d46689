//! Error types for asset loading and writeback.
//!
//! All fallible functions in this crate return [`Result<T>`], which uses [`Error`]
//! as the error type. External error types (`std::io::Error`, `serde_json::Error`,
//! catalog errors) are automatically converted via `From` impls.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or writing game files.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed (reading sources, writing outputs, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse or serialize JSON (provenance log).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A catalog pair could not be read. Bad data file names and missing data
    /// files surface here and are configuration problems of that pair.
    #[error("Catalog error: {0}")]
    Catalog(#[from] x3_catalog::CatalogError),

    /// The requested virtual path was found nowhere and the caller required it.
    #[error("Missing asset: {0}")]
    MissingAsset(String),

    /// Bytes were found but neither standard nor legacy decompression worked.
    #[error("Failed to decode '{path}' from {source_path}: {reason}")]
    DecodeFailure {
        path: String,
        source_path: Utf8PathBuf,
        reason: String,
    },

    /// The installation or tool settings are unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A pre-existing file could not be moved out of the way before writing.
    #[error("Cannot clear '{path}' for writing: {reason}")]
    WriteConflict { path: Utf8PathBuf, reason: String },

    /// A file's content could not be encoded for writing.
    #[error("Cannot serialize '{path}': {reason}")]
    Serialize { path: String, reason: String },
}

impl Error {
    /// Whether this error comes from the installation or settings rather than
    /// from a single asset.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_)
                | Error::Catalog(
                    x3_catalog::CatalogError::InvalidDataName { .. }
                        | x3_catalog::CatalogError::MissingDataFile { .. }
                )
        )
    }
}
