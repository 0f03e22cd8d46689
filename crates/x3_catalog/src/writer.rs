//! Building new catalog pairs.

use crate::cipher::{apply_entry_cipher, encode_index};
use crate::error::Result;
use crate::index::CatalogIndex;
use crate::pair::{pair_file_name, DATA_EXTENSION};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::Write;

/// Collects payloads and writes them out as a `.cat`/`.dat` pair.
///
/// Entries are written in insertion order. Adding the same internal path twice
/// keeps both entries in the data file; readers resolve to the later one.
#[derive(Debug, Default)]
pub struct CatalogWriter {
    items: Vec<(String, Vec<u8>)>,
}

impl CatalogWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a payload under `path`. Backslashes are normalized to `/`.
    pub fn add(&mut self, path: impl AsRef<str>, bytes: Vec<u8>) {
        self.items.push((path.as_ref().replace('\\', "/"), bytes));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Write the pair as `NN.cat`/`NN.dat` into `dir`, returning the index path.
    pub fn write_pair(&self, dir: &Utf8Path, number: u32) -> Result<Utf8PathBuf> {
        let cat_path = dir.join(pair_file_name(number));
        self.write_to(&cat_path)?;
        Ok(cat_path)
    }

    /// Write the pair with its index at `cat_path` and data file next to it.
    pub fn write_to(&self, cat_path: &Utf8Path) -> Result<()> {
        let dat_path = cat_path.with_extension(DATA_EXTENSION);
        if let Some(parent) = cat_path.parent() {
            std::fs::create_dir_all(parent.as_std_path())?;
        }

        let dat_name = dat_path.file_name().unwrap_or(DATA_EXTENSION);
        let mut index = CatalogIndex::new(dat_name);

        let mut data = std::io::BufWriter::new(std::fs::File::create(dat_path.as_std_path())?);
        for (path, bytes) in &self.items {
            let mut encoded = bytes.clone();
            apply_entry_cipher(&mut encoded);
            data.write_all(&encoded)?;
            index.push(path.clone(), bytes.len() as u64)?;
        }
        data.flush()?;

        std::fs::write(cat_path.as_std_path(), encode_index(&index.to_text()))?;

        tracing::info!(
            "Wrote catalog {} with {} entries ({} bytes)",
            cat_path,
            index.len(),
            index.data_len()
        );

        Ok(())
    }
}
