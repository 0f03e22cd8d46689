//! Parsed form of a catalog index (`.cat`) file.
//!
//! After the index cipher is removed the file is plain text:
//!
//! ```text
//! 01.dat
//! types/TShips.pck 4211
//! director/3.01 Generic Missions.pck 80113
//!
//! ```
//!
//! The first line names the paired data file. Every following line is an
//! internal path and a byte length separated by the *last* space, since paths
//! may contain spaces themselves. A blank line ends the entry list. Entries are
//! stored back to back in the data file, so the offset of each entry is the sum
//! of the lengths before it.

use crate::error::{CatalogError, Result};
use std::collections::HashMap;

/// One packed file inside a catalog pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Internal path as written in the index (forward slashes, original case).
    pub path: String,
    /// Payload length in bytes.
    pub length: u64,
    /// Byte offset of the payload within the data file.
    pub offset: u64,
}

/// Ordered entry table of a catalog pair.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    data_name: String,
    entries: Vec<CatalogEntry>,
    /// Lowercased path -> position in `entries`. Later duplicates win.
    by_path: HashMap<String, usize>,
}

impl CatalogIndex {
    /// Create an empty index that declares `data_name` as its data file.
    pub fn new(data_name: impl Into<String>) -> Self {
        Self {
            data_name: data_name.into(),
            ..Default::default()
        }
    }

    /// Parse decoded index text.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));

        let data_name = match lines.next() {
            Some(first) if !first.trim().is_empty() => first.trim().to_string(),
            _ => return Err(CatalogError::EmptyIndex),
        };

        let mut index = Self::new(data_name);
        for (line_no, line) in lines.enumerate() {
            if line.is_empty() {
                break;
            }

            let (path, length) =
                line.rsplit_once(' ')
                    .ok_or_else(|| CatalogError::MalformedEntry {
                        line: line_no + 2,
                        text: line.to_string(),
                    })?;
            let length = length
                .trim()
                .parse::<u64>()
                .map_err(|_| CatalogError::MalformedEntry {
                    line: line_no + 2,
                    text: line.to_string(),
                })?;

            index.push(path, length)?;
        }

        Ok(index)
    }

    /// Append an entry; its offset follows the previous entry.
    ///
    /// Fails when the entry would end past `u64::MAX`.
    pub fn push(&mut self, path: impl Into<String>, length: u64) -> Result<()> {
        let path = path.into();
        let offset = self.data_len();
        if offset.checked_add(length).is_none() {
            return Err(CatalogError::MalformedEntry {
                line: self.entries.len() + 2,
                text: format!("{} {}", path, length),
            });
        }
        self.by_path
            .insert(path.to_ascii_lowercase(), self.entries.len());
        self.entries.push(CatalogEntry {
            path,
            length,
            offset,
        });
        Ok(())
    }

    /// Render the index back to its text form. Inverse of [`parse`](Self::parse).
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity(self.entries.len() * 32);
        text.push_str(&self.data_name);
        text.push('\n');
        for entry in &self.entries {
            text.push_str(&entry.path);
            text.push(' ');
            text.push_str(&entry.length.to_string());
            text.push('\n');
        }
        text
    }

    /// Data file name as declared by the first index line.
    pub fn data_name(&self) -> &str {
        &self.data_name
    }

    /// Entries in index order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Case-insensitive lookup of an internal path.
    pub fn get(&self, path: &str) -> Option<&CatalogEntry> {
        self.by_path
            .get(&path.replace('\\', "/").to_ascii_lowercase())
            .map(|&i| &self.entries[i])
    }

    /// Total number of data bytes described by the index.
    pub fn data_len(&self) -> u64 {
        self.entries
            .last()
            .map(|e| e.offset + e.length)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
