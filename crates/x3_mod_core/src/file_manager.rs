//! The [`FileManager`]: load, edit, write back.
//!
//! # Write algorithm
//!
//! 1. Load every override-folder file that was not loaded yet, so the whole
//!    override folder is copied through.
//! 2. Select the output set: cached files that are modified, synthetic or
//!    read from the override folder. Each output claims its target path and
//!    the target's compressed sibling.
//! 3. Cleanup. Prior outputs outside the claimed set are deleted if they still
//!    hold the tool's content; edited ones are left in place and forgotten.
//!    Backups from earlier runs are moved back when their original name is
//!    free, and kept when that name is about to be written again.
//! 4. Writeback. Each output is serialized and written under the
//!    conflict-safe rename contract, and the ledger is flushed after each one.
//!
//! Per-file failures are logged and collected in the [`WriteReport`]; the run
//! carries on with the next file.

use crate::error::{Error, Result};
use crate::game_file::GameFile;
use crate::provenance::ProvenanceLog;
use crate::resolver::{ResolvedSource, Resolution, Resolver};
use crate::routing::compressed_sibling;
use crate::settings::Settings;
use crate::utils::path_key;
use crate::virtual_path::VirtualPath;
use crate::writeback::{self, BackupState, PriorOutput};
use camino::Utf8PathBuf;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Version tag stored in the ledger.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A load that failed with an error (not a plain absence).
#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub path: VirtualPath,
    pub reason: String,
    /// The failure came from the installation setup rather than the file.
    pub configuration: bool,
}

/// A file that could not be written or cleaned up.
#[derive(Debug, Clone)]
pub struct WriteFailure {
    pub path: Utf8PathBuf,
    pub reason: String,
}

/// Summary of [`FileManager::write_all`].
#[derive(Debug, Default)]
pub struct WriteReport {
    pub written: Vec<Utf8PathBuf>,
    /// User files moved to a backup name this run.
    pub renamed: Vec<Utf8PathBuf>,
    /// Prior outputs deleted because nothing produced them this run.
    pub removed: Vec<Utf8PathBuf>,
    /// Originals moved back from their backup name.
    pub restored: Vec<Utf8PathBuf>,
    pub failed: Vec<WriteFailure>,
}

impl WriteReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Progress information emitted during [`FileManager::write_all`].
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteProgress {
    pub stage: WriteStage,
    /// File currently being written (set during `Writing`).
    pub current_file: Option<String>,
    /// 1-based index of the file being written.
    pub current: u32,
    pub total: u32,
}

/// Stages of a write, emitted in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WriteStage {
    CopyingOverrides,
    Cleanup,
    Writing,
    Complete,
}

type ProgressCallback = Arc<dyn Fn(WriteProgress) + Send + Sync>;

/// Owns the state of one customization run.
///
/// ```no_run
/// use x3_mod_core::{Field, FileManager, Settings};
///
/// # fn main() -> x3_mod_core::Result<()> {
/// let mut manager = FileManager::new(Settings::new("C:/Games/X3 Terran Conflict"))?;
///
/// let ships = manager.load("types/TShips.txt")?;
/// if let Some(table) = ships.records_mut() {
///     for ship in table.records_mut() {
///         let speed: f64 = ship.get(Field::Speed).unwrap_or("0").parse().unwrap_or(0.0);
///         ship.set(Field::Speed, format!("{}", (speed * 1.1) as i64));
///     }
/// }
///
/// let report = manager.write_all()?;
/// println!("wrote {} files", report.written.len());
/// # Ok(())
/// # }
/// ```
pub struct FileManager {
    settings: Settings,
    resolver: Resolver,
    log: ProvenanceLog,

    files: BTreeMap<VirtualPath, GameFile>,
    /// Paths already looked up and found absent (or empty).
    missing: HashSet<VirtualPath>,
    failures: Vec<LoadFailure>,

    progress_callback: Option<ProgressCallback>,
}

impl FileManager {
    /// Validate `settings`, open the ledger and discover sources.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        tracing::info!("Game dir: {}", settings.game_dir);
        if let Some(dir) = &settings.override_dir {
            tracing::info!("Override folder: {}", dir);
        }

        let log = ProvenanceLog::open(settings.log_path(), &settings.game_dir, TOOL_VERSION);
        let resolver = Resolver::new(&settings);

        Ok(Self {
            settings,
            resolver,
            log,
            files: BTreeMap::new(),
            missing: HashSet::new(),
            failures: Vec::new(),
            progress_callback: None,
        })
    }

    /// Register a progress callback for [`write_all`](Self::write_all).
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(WriteProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn provenance(&self) -> &ProvenanceLog {
        &self.log
    }

    /// Loaded files in path order.
    pub fn loaded_files(&self) -> impl Iterator<Item = &GameFile> {
        self.files.values()
    }

    /// Load failures recorded so far.
    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    pub fn has_configuration_failure(&self) -> bool {
        self.failures.iter().any(|f| f.configuration)
    }

    /// Virtual paths present in the override folder.
    pub fn override_virtual_paths(&self) -> Vec<VirtualPath> {
        self.resolver.override_virtual_paths()
    }

    /// Load `path`, or `None` if no source has it.
    ///
    /// The first load of a path resolves and decodes it; later calls return
    /// the cached instance, with any edits made through it.
    pub fn try_load(&mut self, path: impl Into<VirtualPath>) -> Result<Option<&mut GameFile>> {
        let path = path.into();
        if self.files.contains_key(&path) {
            return Ok(self.files.get_mut(&path));
        }
        if self.missing.contains(&path) {
            return Ok(None);
        }

        let resolution = match self.resolver.resolve(&path, &self.log) {
            Ok(resolution) => resolution,
            Err(e) => {
                self.record_failure(&path, &e);
                return Err(e);
            }
        };

        match resolution {
            Resolution::Found(ResolvedSource { bytes, source }) => {
                let file = GameFile::from_bytes(path.clone(), bytes, source);
                Ok(Some(self.files.entry(path).or_insert(file)))
            }
            Resolution::Empty(source) => {
                tracing::debug!("'{}' is empty in {}", path, source.physical_path);
                self.missing.insert(path);
                Ok(None)
            }
            Resolution::NotFound => {
                self.missing.insert(path);
                Ok(None)
            }
        }
    }

    /// Load `path`, failing with [`Error::MissingAsset`] if no source has it.
    pub fn load(&mut self, path: impl Into<VirtualPath>) -> Result<&mut GameFile> {
        let path = path.into();
        if self.try_load(path.clone())?.is_none() {
            let err = Error::MissingAsset(path.to_string());
            self.record_failure(&path, &err);
            return Err(err);
        }
        self.files
            .get_mut(&path)
            .ok_or_else(|| Error::MissingAsset(path.to_string()))
    }

    /// Register a file created from scratch. Replaces any cached file at the
    /// same path.
    pub fn add_synthetic(&mut self, path: impl Into<VirtualPath>, bytes: Vec<u8>) -> &mut GameFile {
        let path = path.into();
        self.missing.remove(&path);
        let file = GameFile::synthetic(path.clone(), bytes);
        match self.files.entry(path) {
            Entry::Occupied(mut entry) => {
                tracing::debug!("Replacing cached '{}' with a synthetic file", entry.key());
                entry.insert(file);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(file),
        }
    }

    fn record_failure(&mut self, path: &VirtualPath, err: &Error) {
        tracing::warn!("Failed to load '{}': {}", path, err);
        self.failures.push(LoadFailure {
            path: path.clone(),
            reason: err.to_string(),
            configuration: err.is_configuration(),
        });
    }

    /// Write every output of this run. See the module docs for the algorithm.
    ///
    /// With nothing loaded and no override folder this removes all prior
    /// output and restores every backup.
    pub fn write_all(&mut self) -> Result<WriteReport> {
        let start_time = std::time::Instant::now();
        let mut report = WriteReport::default();

        self.copy_through_overrides();

        let outputs: Vec<(VirtualPath, Utf8PathBuf)> = self
            .files
            .values()
            .filter(|f| f.is_modified() || f.is_synthetic() || f.is_from_override())
            .map(|f| (f.virtual_path().clone(), f.output_path(&self.settings)))
            .collect();

        let mut claimed = HashSet::new();
        for (_, target) in &outputs {
            claimed.insert(path_key(target));
            if let Some(sibling) = compressed_sibling(target) {
                claimed.insert(path_key(&sibling));
            }
        }

        tracing::info!("Writing {} files...", outputs.len());

        self.emit_progress(WriteProgress {
            stage: WriteStage::Cleanup,
            current_file: None,
            current: 0,
            total: 0,
        });
        self.cleanup(&claimed, &mut report);

        let total = outputs.len() as u32;
        for (idx, (path, target)) in outputs.into_iter().enumerate() {
            self.emit_progress(WriteProgress {
                stage: WriteStage::Writing,
                current_file: Some(path.to_string()),
                current: (idx + 1) as u32,
                total,
            });

            let result = match self.files.get(&path) {
                Some(file) => file.serialize(),
                None => Err(Error::MissingAsset(path.to_string())),
            }
            .and_then(|bytes| writeback::write_output(&target, &bytes, &mut self.log));

            match result {
                Ok(write) => {
                    report.written.push(write.path);
                    report.renamed.extend(write.renamed);
                }
                Err(e) => {
                    tracing::warn!("Failed to write '{}' to {}: {}", path, target, e);
                    report.failed.push(WriteFailure {
                        path: target,
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Leaves a ledger with the current version tag even when nothing changed.
        self.log.flush()?;

        self.emit_progress(WriteProgress {
            stage: WriteStage::Complete,
            current_file: None,
            current: total,
            total,
        });

        tracing::info!(
            "Write finished in {:?}: {} written, {} renamed, {} removed, {} restored, {} failed",
            start_time.elapsed(),
            report.written.len(),
            report.renamed.len(),
            report.removed.len(),
            report.restored.len(),
            report.failed.len()
        );

        Ok(report)
    }

    /// Load the override files nobody asked for so they are written too.
    fn copy_through_overrides(&mut self) {
        let pending: Vec<VirtualPath> = self
            .resolver
            .override_virtual_paths()
            .into_iter()
            .filter(|p| !self.files.contains_key(p) && !self.missing.contains(p))
            .collect();
        if pending.is_empty() {
            return;
        }

        self.emit_progress(WriteProgress {
            stage: WriteStage::CopyingOverrides,
            current_file: None,
            current: 0,
            total: pending.len() as u32,
        });
        tracing::info!("Copying through {} override files", pending.len());

        for path in pending {
            // Failures are already recorded by try_load.
            if let Err(e) = self.try_load(path.clone()) {
                tracing::debug!("Override file '{}' not copied: {}", path, e);
            }
        }
    }

    fn cleanup(&mut self, claimed: &HashSet<String>, report: &mut WriteReport) {
        for prior in self.log.paths_written_last_run() {
            if claimed.contains(&path_key(&prior)) {
                continue;
            }
            match writeback::remove_prior_output(&prior, &mut self.log) {
                Ok(PriorOutput::Removed) => report.removed.push(prior),
                Ok(PriorOutput::UserModified | PriorOutput::Missing) => {}
                Err(e) => {
                    tracing::warn!("Failed to remove prior output {}: {}", prior, e);
                    report.failed.push(WriteFailure {
                        path: prior,
                        reason: e.to_string(),
                    });
                }
            }
        }

        for (original, backup) in self.log.renamed_pairs_last_run() {
            if claimed.contains(&path_key(&original)) && backup.as_std_path().is_file() {
                tracing::debug!("Keeping backup {} for rewritten {}", backup, original);
                continue;
            }
            match writeback::restore_backup(&original, &backup, &mut self.log) {
                Ok(BackupState::Restored) => report.restored.push(original),
                Ok(BackupState::Missing) => {
                    tracing::debug!("Backup {} is gone; forgetting it", backup);
                }
                Ok(BackupState::Blocked) => {
                    tracing::warn!(
                        "Cannot restore {}: the name is taken; the original stays at {}",
                        original,
                        backup
                    );
                }
                Err(e) => {
                    tracing::warn!("Failed to restore {} from {}: {}", original, backup, e);
                    report.failed.push(WriteFailure {
                        path: original,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    fn emit_progress(&self, progress: WriteProgress) {
        if let Some(callback) = &self.progress_callback {
            callback(progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn install() -> (tempfile::TempDir, Settings) {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::create_dir_all(root.join("addon/types")).unwrap();
        (dir, Settings::new(&root))
    }

    #[test]
    fn test_new_rejects_bad_install() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let err = FileManager::new(Settings::new(&root)).err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_try_load_absent() {
        let (_dir, settings) = install();
        let mut manager = FileManager::new(settings).unwrap();
        assert!(manager.try_load("types/TNothing.txt").unwrap().is_none());
        assert!(manager.failures().is_empty());
    }

    #[test]
    fn test_load_absent_is_error() {
        let (_dir, settings) = install();
        let mut manager = FileManager::new(settings).unwrap();
        let err = manager.load("types/TNothing.txt").unwrap_err();
        assert!(matches!(err, Error::MissingAsset(_)));
        assert_eq!(manager.failures().len(), 1);
        assert!(!manager.has_configuration_failure());
    }

    #[test]
    fn test_single_live_instance() {
        let (_dir, settings) = install();
        std::fs::write(settings.primary_dir().join("types/TFoo.txt"), b"1;1;\na;b;\n").unwrap();
        let mut manager = FileManager::new(settings).unwrap();

        manager.load("types/TFoo.txt").unwrap().records_mut().unwrap().records_mut()[0].set_index(0, "z");
        let again = manager.load("TYPES/tfoo.TXT").unwrap();
        assert_eq!(again.records().unwrap().records()[0].get_index(0), Some("z"));
    }

    #[test]
    fn test_add_synthetic() {
        let (_dir, settings) = install();
        let mut manager = FileManager::new(settings).unwrap();
        assert!(manager.try_load("scripts/a.xml").unwrap().is_none());

        manager.add_synthetic("scripts/a.xml", b"<a/>".to_vec());
        assert_eq!(manager.try_load("scripts/a.xml").unwrap().unwrap().text(), Some("<a/>"));
    }

    #[test]
    fn test_progress_stages() {
        use std::sync::Mutex;

        let (_dir, settings) = install();
        let stages = Arc::new(Mutex::new(Vec::new()));
        let sink = stages.clone();
        let mut manager = FileManager::new(settings)
            .unwrap()
            .with_progress(move |p| sink.lock().unwrap().push(p.stage));

        manager.add_synthetic("scripts/a.xml", b"<a/>".to_vec());
        manager.write_all().unwrap();

        assert_eq!(
            *stages.lock().unwrap(),
            vec![WriteStage::Cleanup, WriteStage::Writing, WriteStage::Complete]
        );
    }
}
