//! Provenance ledger: what earlier runs wrote and renamed.
//!
//! The ledger lets a run tell its own prior output apart from the user's files.
//! It is loaded once when a [`FileManager`](crate::FileManager) is created and
//! rewritten after every individual write, rename or cleanup step, so an
//! interrupted run still leaves a record of everything the tool touched.
//!
//! The *previous* ledger is the one loaded from disk. The *current* ledger
//! starts as a copy of it and is what gets persisted.
//!
//! # JSON format
//!
//! ```json
//! {
//!   "version": "0.1.0",
//!   "written": [{ "path": "addon/types/TShips.txt", "fingerprint": "9f2c0a..." }],
//!   "renamed": [{ "original": "addon/types/TShips.pck", "backup": "addon/types/TShips.pck.x3c.bak" }]
//! }
//! ```
//!
//! Paths are stored relative to the game directory.

use crate::error::Result;
use crate::utils::{absolute_from, path_key, relative_to};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Suffix appended to a user file moved aside before its slot is written.
pub const BACKUP_SUFFIX: &str = ".x3c.bak";

/// A file written by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenEntry {
    pub path: String,
    pub fingerprint: String,
}

/// A pre-existing file moved to a backup name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamedEntry {
    pub original: String,
    pub backup: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Ledger {
    #[serde(default)]
    version: String,
    #[serde(default)]
    written: Vec<WrittenEntry>,
    #[serde(default)]
    renamed: Vec<RenamedEntry>,
}

impl Ledger {
    fn written(&self, key: &str) -> Option<&WrittenEntry> {
        self.written
            .iter()
            .find(|e| path_key(Utf8Path::new(&e.path)) == key)
    }

    fn renamed(&self, key: &str) -> Option<&RenamedEntry> {
        self.renamed
            .iter()
            .find(|e| path_key(Utf8Path::new(&e.original)) == key)
    }
}

/// Previous and current ledgers for one run.
#[derive(Debug)]
pub struct ProvenanceLog {
    path: Utf8PathBuf,
    root: Utf8PathBuf,
    previous: Ledger,
    current: Ledger,
}

impl ProvenanceLog {
    /// Load the ledger at `path`, with entries relative to `root`.
    ///
    /// A missing ledger is an empty history. An unreadable one is logged and
    /// also treated as empty.
    pub fn open(path: impl Into<Utf8PathBuf>, root: impl Into<Utf8PathBuf>, tool_version: &str) -> Self {
        let path = path.into();
        let previous = match read_ledger(&path) {
            Ok(Some(ledger)) => {
                tracing::debug!(
                    "Loaded ledger {} (version '{}', {} written, {} renamed)",
                    path,
                    ledger.version,
                    ledger.written.len(),
                    ledger.renamed.len()
                );
                ledger
            }
            Ok(None) => Ledger::default(),
            Err(e) => {
                tracing::warn!("Ignoring unreadable ledger {}: {}", path, e);
                Ledger::default()
            }
        };

        let mut current = previous.clone();
        current.version = tool_version.to_string();

        Self {
            path,
            root: root.into(),
            previous,
            current,
        }
    }

    /// Ledger file location.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn key(&self, path: &Utf8Path) -> String {
        path_key(Utf8Path::new(&relative_to(path, &self.root)))
    }

    /// Whether the previous run recorded writing `path`.
    pub fn is_produced_by_last_run(&self, path: &Utf8Path) -> bool {
        self.previous.written(&self.key(path)).is_some()
    }

    /// Fingerprint the previous run recorded for `path`.
    pub fn fingerprint_last_run(&self, path: &Utf8Path) -> Option<&str> {
        self.previous
            .written(&self.key(path))
            .map(|e| e.fingerprint.as_str())
    }

    /// Outputs of the previous run.
    pub fn paths_written_last_run(&self) -> Vec<Utf8PathBuf> {
        self.previous
            .written
            .iter()
            .map(|e| absolute_from(&e.path, &self.root))
            .collect()
    }

    /// `(original, backup)` pairs renamed by earlier runs.
    pub fn renamed_pairs_last_run(&self) -> Vec<(Utf8PathBuf, Utf8PathBuf)> {
        self.previous
            .renamed
            .iter()
            .map(|e| {
                (
                    absolute_from(&e.original, &self.root),
                    absolute_from(&e.backup, &self.root),
                )
            })
            .collect()
    }

    /// Backup of `original` recorded by an earlier run.
    pub fn backup_last_run(&self, original: &Utf8Path) -> Option<Utf8PathBuf> {
        self.previous
            .renamed(&self.key(original))
            .map(|e| absolute_from(&e.backup, &self.root))
    }

    /// Fingerprint the tool currently holds for `path`, including this run's
    /// writes.
    pub fn fingerprint(&self, path: &Utf8Path) -> Option<&str> {
        self.current
            .written(&self.key(path))
            .map(|e| e.fingerprint.as_str())
    }

    /// Backup currently tracked for `original`.
    pub fn backup_for(&self, original: &Utf8Path) -> Option<Utf8PathBuf> {
        self.current
            .renamed(&self.key(original))
            .map(|e| absolute_from(&e.backup, &self.root))
    }

    /// Record a completed write and persist the ledger.
    pub fn record_written(&mut self, path: &Utf8Path, fingerprint: impl Into<String>) -> Result<()> {
        let key = self.key(path);
        let fingerprint = fingerprint.into();
        self.current
            .written
            .retain(|e| path_key(Utf8Path::new(&e.path)) != key);
        self.current.written.push(WrittenEntry {
            path: relative_to(path, &self.root),
            fingerprint,
        });
        self.flush()
    }

    /// Record a completed rename and persist the ledger.
    pub fn record_renamed(&mut self, original: &Utf8Path, backup: &Utf8Path) -> Result<()> {
        let key = self.key(original);
        self.current
            .renamed
            .retain(|e| path_key(Utf8Path::new(&e.original)) != key);
        self.current.renamed.push(RenamedEntry {
            original: relative_to(original, &self.root),
            backup: relative_to(backup, &self.root),
        });
        self.flush()
    }

    /// Drop a written entry and persist the ledger.
    pub fn forget_written(&mut self, path: &Utf8Path) -> Result<()> {
        let key = self.key(path);
        let before = self.current.written.len();
        self.current
            .written
            .retain(|e| path_key(Utf8Path::new(&e.path)) != key);
        if self.current.written.len() == before {
            return Ok(());
        }
        self.flush()
    }

    /// Drop a rename entry and persist the ledger.
    pub fn forget_renamed(&mut self, original: &Utf8Path) -> Result<()> {
        let key = self.key(original);
        let before = self.current.renamed.len();
        self.current
            .renamed
            .retain(|e| path_key(Utf8Path::new(&e.original)) != key);
        if self.current.renamed.len() == before {
            return Ok(());
        }
        self.flush()
    }

    /// Write the current ledger to a temporary sibling and move it into place.
    pub fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_str().is_empty() {
                std::fs::create_dir_all(parent.as_std_path())?;
            }
        }

        let contents = serde_json::to_string_pretty(&self.current)?;
        let tmp = Utf8PathBuf::from(format!("{}.tmp", self.path));
        std::fs::write(tmp.as_std_path(), contents)?;
        std::fs::rename(tmp.as_std_path(), self.path.as_std_path())?;
        Ok(())
    }
}

fn read_ledger(path: &Utf8Path) -> Result<Option<Ledger>> {
    if !path.as_std_path().exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path.as_std_path())?;
    Ok(Some(serde_json::from_str(&contents)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
    }

    #[test]
    fn test_missing_ledger_is_empty() {
        let dir = tempdir().unwrap();
        let root = utf8(dir.path());
        let log = ProvenanceLog::open(root.join("log.json"), &root, "0.1.0");
        assert!(log.paths_written_last_run().is_empty());
        assert!(log.renamed_pairs_last_run().is_empty());
    }

    #[test]
    fn test_invalid_ledger_is_empty() {
        let dir = tempdir().unwrap();
        let root = utf8(dir.path());
        std::fs::write(root.join("log.json"), "{ invalid json }").unwrap();

        let log = ProvenanceLog::open(root.join("log.json"), &root, "0.1.0");
        assert!(log.paths_written_last_run().is_empty());
    }

    #[test]
    fn test_record_flushes_immediately() {
        let dir = tempdir().unwrap();
        let root = utf8(dir.path());
        let log_path = root.join("log.json");
        let target = root.join("addon/types/TShips.txt");

        let mut log = ProvenanceLog::open(&log_path, &root, "0.1.0");
        log.record_written(&target, "00000000000000aa").unwrap();

        let json = std::fs::read_to_string(&log_path).unwrap();
        assert!(json.contains("\"version\": \"0.1.0\""));
        assert!(json.contains("addon/types/TShips.txt"));
        assert!(!root.join("log.json.tmp").exists());

        let reopened = ProvenanceLog::open(&log_path, &root, "0.1.0");
        assert!(reopened.is_produced_by_last_run(&target));
        assert_eq!(reopened.fingerprint_last_run(&target), Some("00000000000000aa"));
    }

    #[test]
    fn test_current_starts_from_previous() {
        let dir = tempdir().unwrap();
        let root = utf8(dir.path());
        let log_path = root.join("log.json");
        let a = root.join("addon/types/A.txt");
        let b = root.join("addon/types/B.txt");

        let mut first = ProvenanceLog::open(&log_path, &root, "0.1.0");
        first.record_written(&a, "01").unwrap();

        let mut second = ProvenanceLog::open(&log_path, &root, "0.1.0");
        second.record_written(&b, "02").unwrap();

        let third = ProvenanceLog::open(&log_path, &root, "0.1.0");
        assert!(third.is_produced_by_last_run(&a));
        assert!(third.is_produced_by_last_run(&b));
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let dir = tempdir().unwrap();
        let root = utf8(dir.path());
        let mut log = ProvenanceLog::open(root.join("log.json"), &root, "0.1.0");
        log.record_written(&root.join("addon/types/TShips.txt"), "01").unwrap();
        assert_eq!(log.fingerprint(&root.join("ADDON/Types/tships.txt")), Some("01"));
    }

    #[test]
    fn test_rename_and_forget() {
        let dir = tempdir().unwrap();
        let root = utf8(dir.path());
        let log_path = root.join("log.json");
        let original = root.join("addon/types/TShips.pck");
        let backup = root.join("addon/types/TShips.pck.x3c.bak");

        let mut log = ProvenanceLog::open(&log_path, &root, "0.1.0");
        log.record_renamed(&original, &backup).unwrap();
        assert_eq!(log.backup_for(&original), Some(backup.clone()));

        let mut reopened = ProvenanceLog::open(&log_path, &root, "0.1.0");
        assert_eq!(reopened.renamed_pairs_last_run(), vec![(original.clone(), backup)]);

        reopened.forget_renamed(&original).unwrap();
        assert!(reopened.backup_for(&original).is_none());
        // previous view is unchanged
        assert!(reopened.backup_last_run(&original).is_some());

        let json = std::fs::read_to_string(&log_path).unwrap();
        assert!(!json.contains("TShips.pck"));
    }

    #[test]
    fn test_stored_relative() {
        let dir = tempdir().unwrap();
        let root = utf8(dir.path());
        let log_path = root.join("log.json");
        let mut log = ProvenanceLog::open(&log_path, &root, "0.1.0");
        log.record_written(&root.join("L/x3story.obj"), "01").unwrap();

        let json = std::fs::read_to_string(&log_path).unwrap();
        assert!(json.contains("\"path\": \"L/x3story.obj\""));
        assert!(!json.contains(root.as_str()));
    }
}
