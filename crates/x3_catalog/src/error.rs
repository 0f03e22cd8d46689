//! Error types for catalog operations.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur while reading or writing catalog pairs.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Filesystem I/O failed (opening the index, seeking in the data file, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The index declares a data file whose name does not end in `.dat`.
    #[error("Catalog '{cat_path}' declares invalid data file name '{declared}'")]
    InvalidDataName {
        cat_path: Utf8PathBuf,
        declared: String,
    },

    /// The data file paired with an index does not exist next to it.
    #[error("Catalog '{cat_path}' is missing its data file '{dat_path}'")]
    MissingDataFile {
        cat_path: Utf8PathBuf,
        dat_path: Utf8PathBuf,
    },

    /// The decoded index contained no data file line at all.
    #[error("Catalog index is empty")]
    EmptyIndex,

    /// An entry line could not be split into a path and a byte length.
    #[error("Malformed catalog entry on line {line}: '{text}'")]
    MalformedEntry { line: usize, text: String },

    /// An entry points past the end of its data file.
    #[error("Entry '{path}' ({offset}+{length}) exceeds data file size {data_len}")]
    EntryOutOfBounds {
        path: String,
        offset: u64,
        length: u64,
        data_len: u64,
    },

    /// Neither standard nor legacy decompression could decode a payload.
    #[error("Decompression failed: {primary}; legacy fallback: {fallback}")]
    Decompression { primary: String, fallback: String },
}
