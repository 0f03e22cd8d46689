//! Loaded game files and their content models.
//!
//! A [`GameFile`] is the decoded content of one virtual path plus where it came
//! from. The content model is chosen from the path:
//!
//! | Path                       | Model                        |
//! |----------------------------|------------------------------|
//! | `types/*.txt`              | [`RecordTable`]              |
//! | other `.txt`, any `.xml`   | [`FreeformText`]             |
//! | everything else            | raw bytes                    |
//!
//! Files that were never edited serialize to the exact bytes they were read
//! from.

pub mod freeform;
pub mod layouts;
pub mod record_table;

pub use freeform::FreeformText;
pub use layouts::{Field, Layout, TableFormat};
pub use record_table::{Record, RecordTable};

use crate::error::{Error, Result};
use crate::routing;
use crate::settings::Settings;
use crate::virtual_path::VirtualPath;
use camino::Utf8PathBuf;

/// Which layer of the resolution chain a file was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTier {
    Override,
    Loose,
    Catalog,
}

/// Where a file's bytes were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub tier: SourceTier,
    /// The loose file, or the `.cat` index for catalog entries.
    pub physical_path: Utf8PathBuf,
    /// Name the bytes were stored under (may be the compressed form).
    pub stored_as: VirtualPath,
    /// Whether the stored bytes were gzip-compressed.
    pub compressed: bool,
}

/// Decoded content of a [`GameFile`].
#[derive(Debug, Clone)]
pub enum GameFileKind {
    RecordTable(RecordTable),
    FreeformText(FreeformText),
    RawBinary(Vec<u8>),
}

impl GameFileKind {
    fn decode(path: &VirtualPath, bytes: &[u8]) -> Self {
        match path.extension().as_deref() {
            Some("txt") if path.is_in_folder("types") => {
                GameFileKind::RecordTable(RecordTable::from_bytes(path, bytes))
            }
            Some("txt") | Some("xml") => GameFileKind::FreeformText(FreeformText::from_bytes(bytes)),
            _ => GameFileKind::RawBinary(bytes.to_vec()),
        }
    }
}

/// One loaded file.
#[derive(Debug, Clone)]
pub struct GameFile {
    virtual_path: VirtualPath,
    source: Option<SourceInfo>,
    kind: GameFileKind,
    /// Bytes as decoded from the source, for verbatim passthrough.
    original: Option<Vec<u8>>,
    modified: bool,
    synthetic: bool,
}

impl GameFile {
    /// Wrap bytes read from `source`.
    pub fn from_bytes(virtual_path: VirtualPath, bytes: Vec<u8>, source: SourceInfo) -> Self {
        let kind = GameFileKind::decode(&virtual_path, &bytes);
        Self {
            virtual_path,
            source: Some(source),
            kind,
            original: Some(bytes),
            modified: false,
            synthetic: false,
        }
    }

    /// A file created by a transform rather than read from the game.
    pub fn synthetic(virtual_path: VirtualPath, bytes: Vec<u8>) -> Self {
        let kind = GameFileKind::decode(&virtual_path, &bytes);
        Self {
            virtual_path,
            source: None,
            kind,
            original: Some(bytes),
            modified: true,
            synthetic: true,
        }
    }

    pub fn virtual_path(&self) -> &VirtualPath {
        &self.virtual_path
    }

    pub fn source(&self) -> Option<&SourceInfo> {
        self.source.as_ref()
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn is_from_override(&self) -> bool {
        self.source
            .as_ref()
            .is_some_and(|s| s.tier == SourceTier::Override)
    }

    pub fn kind(&self) -> &GameFileKind {
        &self.kind
    }

    pub fn records(&self) -> Option<&RecordTable> {
        match &self.kind {
            GameFileKind::RecordTable(table) => Some(table),
            _ => None,
        }
    }

    /// Mutable table access. Edits made through records are tracked by the
    /// table itself.
    pub fn records_mut(&mut self) -> Option<&mut RecordTable> {
        match &mut self.kind {
            GameFileKind::RecordTable(table) => Some(table),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            GameFileKind::FreeformText(text) => Some(text.text()),
            _ => None,
        }
    }

    /// Replace the text of a free-form file. Returns `false` for other kinds.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        match &mut self.kind {
            GameFileKind::FreeformText(file) => {
                file.set_text(text);
                true
            }
            _ => false,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.kind {
            GameFileKind::RawBinary(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Mutable raw bytes. Marks the file modified.
    pub fn bytes_mut(&mut self) -> Option<&mut Vec<u8>> {
        match &mut self.kind {
            GameFileKind::RawBinary(bytes) => {
                self.modified = true;
                Some(bytes)
            }
            _ => None,
        }
    }

    /// Force the file to be treated as edited.
    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
            || match &self.kind {
                GameFileKind::RecordTable(table) => table.is_modified(),
                GameFileKind::FreeformText(text) => text.is_modified(),
                GameFileKind::RawBinary(_) => false,
            }
    }

    /// Bytes to write, uncompressed.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        if !self.is_modified() {
            if let Some(original) = &self.original {
                return Ok(original.clone());
            }
        }

        let encoded = match &self.kind {
            GameFileKind::RecordTable(table) => table.to_bytes(),
            GameFileKind::FreeformText(text) => text.to_bytes(),
            GameFileKind::RawBinary(bytes) => Some(bytes.clone()),
        };
        encoded.ok_or_else(|| Error::Serialize {
            path: self.virtual_path.to_string(),
            reason: "text contains characters its encoding cannot represent".into(),
        })
    }

    /// Loose location the game reads this file from.
    pub fn output_path(&self, settings: &Settings) -> Utf8PathBuf {
        routing::output_path(settings, &self.virtual_path)
    }
}
