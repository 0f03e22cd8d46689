//! Lazily-opened catalog pairs and their discovery on disk.

use crate::cipher::{apply_entry_cipher, decode_index};
use crate::error::{CatalogError, Result};
use crate::index::{CatalogEntry, CatalogIndex};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::{Read, Seek, SeekFrom};

/// Extension of catalog index files.
pub const INDEX_EXTENSION: &str = "cat";

/// Extension of catalog data files.
pub const DATA_EXTENSION: &str = "dat";

/// One `.cat`/`.dat` pair.
///
/// Opening a pair only records its paths. The index is read and parsed the
/// first time a lookup reaches it, then kept for the lifetime of the value.
#[derive(Debug)]
pub struct CatalogPair {
    cat_path: Utf8PathBuf,
    dat_path: Utf8PathBuf,
    index: Option<CatalogIndex>,
}

impl CatalogPair {
    /// Create a pair for the index at `cat_path`.
    ///
    /// The data file is always the index's base name with a `.dat` extension.
    /// The name declared inside the index is only checked for plausibility when
    /// the index is parsed.
    pub fn open(cat_path: impl Into<Utf8PathBuf>) -> Self {
        let cat_path = cat_path.into();
        let dat_path = cat_path.with_extension(DATA_EXTENSION);
        Self {
            cat_path,
            dat_path,
            index: None,
        }
    }

    pub fn cat_path(&self) -> &Utf8Path {
        &self.cat_path
    }

    pub fn dat_path(&self) -> &Utf8Path {
        &self.dat_path
    }

    /// Whether the index has already been parsed.
    pub fn is_loaded(&self) -> bool {
        self.index.is_some()
    }

    /// Parsed index, loading it on first use.
    pub fn index(&mut self) -> Result<&CatalogIndex> {
        let index = match self.index.take() {
            Some(index) => index,
            None => self.load_index()?,
        };
        Ok(self.index.insert(index))
    }

    /// Entries of this pair in index order.
    pub fn entries(&mut self) -> Result<&[CatalogEntry]> {
        Ok(self.index()?.entries())
    }

    /// Case-insensitive lookup of an internal path.
    pub fn lookup(&mut self, path: &str) -> Result<Option<CatalogEntry>> {
        Ok(self.index()?.get(path).cloned())
    }

    /// Read and decode the payload for `path`, if the pair contains it.
    pub fn read(&mut self, path: &str) -> Result<Option<Vec<u8>>> {
        match self.lookup(path)? {
            Some(entry) => self.read_entry(&entry).map(Some),
            None => Ok(None),
        }
    }

    /// Read and decode the payload described by `entry`.
    pub fn read_entry(&self, entry: &CatalogEntry) -> Result<Vec<u8>> {
        let mut file = std::fs::File::open(self.dat_path.as_std_path())?;
        let data_len = file.metadata()?.len();
        let end = entry.offset.checked_add(entry.length);
        if end.map_or(true, |end| end > data_len) {
            return Err(CatalogError::EntryOutOfBounds {
                path: entry.path.clone(),
                offset: entry.offset,
                length: entry.length,
                data_len,
            });
        }

        file.seek(SeekFrom::Start(entry.offset))?;
        let mut buf = vec![0u8; entry.length as usize];
        file.read_exact(&mut buf)?;
        apply_entry_cipher(&mut buf);
        Ok(buf)
    }

    fn load_index(&self) -> Result<CatalogIndex> {
        tracing::debug!("Parsing catalog index {}", self.cat_path);

        let raw = std::fs::read(self.cat_path.as_std_path())?;
        let index = CatalogIndex::parse(&decode_index(&raw))?;

        let declared = index.data_name();
        let declared_ext = Utf8Path::new(declared)
            .extension()
            .map(|e| e.to_ascii_lowercase());
        if declared_ext.as_deref() != Some(DATA_EXTENSION) {
            return Err(CatalogError::InvalidDataName {
                cat_path: self.cat_path.clone(),
                declared: declared.to_string(),
            });
        }

        let expected = self.dat_path.file_name().unwrap_or_default();
        let declared_name = Utf8Path::new(declared).file_name().unwrap_or(declared);
        if !declared_name.eq_ignore_ascii_case(expected) {
            tracing::warn!(
                "Catalog {} declares data file '{}', using '{}' instead",
                self.cat_path,
                declared,
                expected
            );
        }

        if !self.dat_path.as_std_path().is_file() {
            return Err(CatalogError::MissingDataFile {
                cat_path: self.cat_path.clone(),
                dat_path: self.dat_path.clone(),
            });
        }

        tracing::debug!(
            "Catalog {} has {} entries ({} data bytes)",
            self.cat_path,
            index.len(),
            index.data_len()
        );

        Ok(index)
    }
}

/// File name of the `number`-th pair's index (`01.cat`, `02.cat`, ...).
pub fn pair_file_name(number: u32) -> String {
    format!("{:02}.{}", number, INDEX_EXTENSION)
}

/// Find the contiguous run of pairs `01`, `02`, ... in `dir`.
///
/// Returned highest-numbered first, which is the lookup priority order. A
/// missing directory yields no pairs. Discovery stops at the first number
/// whose index file is absent.
pub fn discover_pairs(dir: &Utf8Path) -> Vec<CatalogPair> {
    let mut pairs = Vec::new();
    if !dir.as_std_path().is_dir() {
        return pairs;
    }

    for number in 1.. {
        let cat_path = dir.join(pair_file_name(number));
        if !cat_path.as_std_path().is_file() {
            break;
        }
        pairs.push(CatalogPair::open(cat_path));
    }

    tracing::debug!("Discovered {} catalog pair(s) in {}", pairs.len(), dir);

    pairs.reverse();
    pairs
}

/// Next free pair number in `dir` (one past the contiguous run).
pub fn next_pair_number(dir: &Utf8Path) -> u32 {
    discover_pairs(dir).len() as u32 + 1
}
