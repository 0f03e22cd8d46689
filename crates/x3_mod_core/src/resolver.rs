//! Source resolution for virtual paths.
//!
//! The [`Resolver`] is built once per [`FileManager`](crate::FileManager). It
//! indexes the override folder up front and discovers catalog pairs in both
//! tiers; catalog indexes themselves are parsed on first lookup.
//!
//! # Search order
//!
//! 1. Override folder, compressed name before plain name.
//! 2. Loose files under the primary tier, then the secondary tier (unless
//!    loose files are ignored). Files the previous run wrote are skipped while
//!    they still hold what it wrote; if that run moved a user file aside, the
//!    backup is read instead. A slot the user has since replaced is read as is.
//! 3. Primary-tier catalogs, highest number first.
//! 4. Secondary-tier catalogs, highest number first.
//!
//! The first hit wins. A hit whose decoded payload is empty also ends the
//! search and is reported as [`Resolution::Empty`].

use crate::error::{Error, Result};
use crate::game_file::{SourceInfo, SourceTier};
use crate::provenance::ProvenanceLog;
use crate::routing::{lookup_candidates, plain_form};
use crate::settings::Settings;
use crate::utils::fingerprint_file;
use crate::virtual_path::VirtualPath;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::{BTreeSet, HashMap};
use walkdir::WalkDir;
use x3_catalog::{compression, discover_pairs, CatalogPair};

/// Decoded bytes and their origin.
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    pub bytes: Vec<u8>,
    pub source: SourceInfo,
}

/// Outcome of resolving one virtual path.
#[derive(Debug, Clone)]
pub enum Resolution {
    Found(ResolvedSource),
    /// A source exists but decodes to nothing.
    Empty(SourceInfo),
    NotFound,
}

/// Finds the highest-priority source for virtual paths.
pub struct Resolver {
    primary_dir: Utf8PathBuf,
    secondary_dir: Utf8PathBuf,
    ignore_loose_files: bool,

    /// Override folder contents keyed by their (stored) virtual path.
    override_files: HashMap<VirtualPath, Utf8PathBuf>,

    primary_catalogs: Vec<CatalogPair>,
    secondary_catalogs: Vec<CatalogPair>,
}

impl Resolver {
    pub fn new(settings: &Settings) -> Self {
        let primary_dir = settings.primary_dir();
        let secondary_dir = settings.secondary_dir().to_path_buf();

        let override_files = match &settings.override_dir {
            Some(dir) => index_override_folder(dir),
            None => HashMap::new(),
        };

        let primary_catalogs = discover_pairs(&primary_dir);
        let secondary_catalogs = discover_pairs(&secondary_dir);

        tracing::info!(
            "Resolver ready: {} override files, {} primary catalogs, {} secondary catalogs",
            override_files.len(),
            primary_catalogs.len(),
            secondary_catalogs.len()
        );

        Self {
            primary_dir,
            secondary_dir,
            ignore_loose_files: settings.ignore_loose_files,
            override_files,
            primary_catalogs,
            secondary_catalogs,
        }
    }

    /// Every virtual path present in the override folder, under its plain name.
    pub fn override_virtual_paths(&self) -> Vec<VirtualPath> {
        self.override_files
            .keys()
            .map(plain_form)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Catalog pairs in search order.
    pub fn catalogs_mut(&mut self) -> impl Iterator<Item = &mut CatalogPair> {
        self.primary_catalogs
            .iter_mut()
            .chain(self.secondary_catalogs.iter_mut())
    }

    /// Resolve `path` against every source tier.
    pub fn resolve(&mut self, path: &VirtualPath, log: &ProvenanceLog) -> Result<Resolution> {
        let candidates = lookup_candidates(path);

        if let Some(resolution) = self.resolve_override(path, &candidates)? {
            return Ok(resolution);
        }

        if !self.ignore_loose_files {
            if let Some(resolution) = self.resolve_loose(path, &candidates, log)? {
                return Ok(resolution);
            }
        }

        if let Some(resolution) = self.resolve_catalogs(path, &candidates)? {
            return Ok(resolution);
        }

        tracing::debug!("'{}' not found in any source", path);
        Ok(Resolution::NotFound)
    }

    fn resolve_override(
        &self,
        path: &VirtualPath,
        candidates: &[(VirtualPath, bool)],
    ) -> Result<Option<Resolution>> {
        for (stored_as, compressed) in candidates {
            let Some(physical) = self.override_files.get(stored_as) else {
                continue;
            };
            let raw = std::fs::read(physical.as_std_path())?;
            let source = SourceInfo {
                tier: SourceTier::Override,
                physical_path: physical.clone(),
                stored_as: stored_as.clone(),
                compressed: *compressed,
            };
            return decode(path, raw, source).map(Some);
        }
        Ok(None)
    }

    fn resolve_loose(
        &self,
        path: &VirtualPath,
        candidates: &[(VirtualPath, bool)],
        log: &ProvenanceLog,
    ) -> Result<Option<Resolution>> {
        for root in [&self.primary_dir, &self.secondary_dir] {
            for (stored_as, compressed) in candidates {
                let slot = root.join(stored_as.as_str());
                let Some(physical) = loose_source(&slot, log) else {
                    continue;
                };
                let raw = std::fs::read(physical.as_std_path())?;
                let source = SourceInfo {
                    tier: SourceTier::Loose,
                    physical_path: physical,
                    stored_as: stored_as.clone(),
                    compressed: *compressed,
                };
                return decode(path, raw, source).map(Some);
            }
        }
        Ok(None)
    }

    fn resolve_catalogs(
        &mut self,
        path: &VirtualPath,
        candidates: &[(VirtualPath, bool)],
    ) -> Result<Option<Resolution>> {
        for pair in self.catalogs_mut() {
            for (stored_as, compressed) in candidates {
                let Some(raw) = pair.read(stored_as.as_str())? else {
                    continue;
                };
                let source = SourceInfo {
                    tier: SourceTier::Catalog,
                    physical_path: pair.cat_path().to_path_buf(),
                    stored_as: stored_as.clone(),
                    compressed: *compressed,
                };
                return decode(path, raw, source).map(Some);
            }
        }
        Ok(None)
    }
}

/// The file to read for a loose slot, taking prior output into account.
///
/// A file in the slot that is not byte-identical to what the previous run
/// wrote belongs to the user and wins over any backup.
fn loose_source(slot: &Utf8Path, log: &ProvenanceLog) -> Option<Utf8PathBuf> {
    if slot.as_std_path().is_file() && !is_prior_output(slot, log) {
        return Some(slot.to_path_buf());
    }
    if let Some(backup) = log.backup_last_run(slot) {
        if backup.as_std_path().is_file() {
            tracing::debug!("Reading user original {} from backup {}", slot, backup);
            return Some(backup);
        }
    }
    if log.is_produced_by_last_run(slot) {
        tracing::debug!("Skipping prior output {}", slot);
    }
    None
}

fn is_prior_output(slot: &Utf8Path, log: &ProvenanceLog) -> bool {
    log.fingerprint_last_run(slot)
        .is_some_and(|recorded| fingerprint_file(slot).as_deref() == Some(recorded))
}

fn decode(path: &VirtualPath, raw: Vec<u8>, source: SourceInfo) -> Result<Resolution> {
    let bytes = if source.compressed {
        compression::decompress(&raw).map_err(|e| Error::DecodeFailure {
            path: path.to_string(),
            source_path: source.physical_path.clone(),
            reason: e.to_string(),
        })?
    } else {
        raw
    };

    tracing::debug!(
        "Resolved '{}' from {:?} {} as '{}' ({} bytes)",
        path,
        source.tier,
        source.physical_path,
        source.stored_as,
        bytes.len()
    );

    if bytes.is_empty() {
        return Ok(Resolution::Empty(source));
    }
    Ok(Resolution::Found(ResolvedSource { bytes, source }))
}

/// Walk the override folder and key every file by its relative path.
fn index_override_folder(dir: &Utf8Path) -> HashMap<VirtualPath, Utf8PathBuf> {
    let mut files = HashMap::new();

    for entry in WalkDir::new(dir.as_std_path())
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = match Utf8PathBuf::from_path_buf(entry.into_path()) {
            Ok(p) => p,
            Err(p) => {
                tracing::warn!("Skipping non-UTF-8 path: {}", p.display());
                continue;
            }
        };
        let Ok(relative) = path.strip_prefix(dir) else {
            continue;
        };
        files.insert(VirtualPath::new(relative.as_str()), path.clone());
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, Settings) {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::create_dir_all(root.join("addon/types")).unwrap();
        let settings = Settings::new(&root);
        (dir, settings)
    }

    fn open_log(settings: &Settings) -> ProvenanceLog {
        ProvenanceLog::open(settings.log_path(), &settings.game_dir, "test")
    }

    fn found(resolution: Resolution) -> ResolvedSource {
        match resolution {
            Resolution::Found(resolved) => resolved,
            other => panic!("expected a hit, got {:?}", other),
        }
    }

    #[test]
    fn test_loose_compressed_preferred() {
        let (_dir, settings) = setup();
        let types = settings.primary_dir().join("types");
        std::fs::write(types.join("TShips.txt"), b"plain").unwrap();
        std::fs::write(types.join("TShips.pck"), compression::compress(b"packed").unwrap()).unwrap();

        let log = open_log(&settings);
        let mut resolver = Resolver::new(&settings);
        let hit = found(resolver.resolve(&"types/TShips.txt".into(), &log).unwrap());
        assert_eq!(hit.bytes, b"packed");
        assert!(hit.source.compressed);
        assert_eq!(hit.source.tier, SourceTier::Loose);
    }

    #[test]
    fn test_ignore_loose_files() {
        let (_dir, settings) = setup();
        std::fs::write(settings.primary_dir().join("types/TShips.txt"), b"plain").unwrap();

        let settings = settings.ignore_loose_files(true);
        let log = open_log(&settings);
        let mut resolver = Resolver::new(&settings);
        assert!(matches!(
            resolver.resolve(&"types/TShips.txt".into(), &log).unwrap(),
            Resolution::NotFound
        ));
    }

    #[test]
    fn test_empty_payload() {
        let (_dir, settings) = setup();
        std::fs::write(settings.primary_dir().join("types/TEmpty.txt"), b"").unwrap();

        let log = open_log(&settings);
        let mut resolver = Resolver::new(&settings);
        assert!(matches!(
            resolver.resolve(&"types/TEmpty.txt".into(), &log).unwrap(),
            Resolution::Empty(_)
        ));
    }

    #[test]
    fn test_undecodable_payload() {
        let (_dir, settings) = setup();
        std::fs::write(settings.primary_dir().join("types/TBad.pck"), b"\x00\x01\x02\x03").unwrap();

        let log = open_log(&settings);
        let mut resolver = Resolver::new(&settings);
        let err = resolver.resolve(&"types/TBad.txt".into(), &log).unwrap_err();
        assert!(matches!(err, Error::DecodeFailure { .. }));
    }

    #[test]
    fn test_prior_output_skipped() {
        let (_dir, settings) = setup();
        let slot = settings.primary_dir().join("types/TShips.txt");
        std::fs::write(&slot, b"written by tool").unwrap();

        let mut log = open_log(&settings);
        log.record_written(&slot, crate::utils::fingerprint(b"written by tool")).unwrap();
        let log = open_log(&settings);

        let mut resolver = Resolver::new(&settings);
        assert!(matches!(
            resolver.resolve(&"types/TShips.txt".into(), &log).unwrap(),
            Resolution::NotFound
        ));
    }

    #[test]
    fn test_backup_read_instead_of_prior_output() {
        let (_dir, settings) = setup();
        let slot = settings.primary_dir().join("types/TShips.txt");
        let backup = settings.primary_dir().join("types/TShips.txt.x3c.bak");
        std::fs::write(&slot, b"written by tool").unwrap();
        std::fs::write(&backup, b"user original").unwrap();

        let mut log = open_log(&settings);
        log.record_renamed(&slot, &backup).unwrap();
        log.record_written(&slot, crate::utils::fingerprint(b"written by tool")).unwrap();
        let log = open_log(&settings);

        let mut resolver = Resolver::new(&settings);
        let hit = found(resolver.resolve(&"types/TShips.txt".into(), &log).unwrap());
        assert_eq!(hit.bytes, b"user original");
        assert_eq!(hit.source.physical_path, backup);
    }

    #[test]
    fn test_replaced_slot_read_instead_of_backup() {
        let (_dir, settings) = setup();
        let slot = settings.primary_dir().join("types/TShips.txt");
        let backup = settings.primary_dir().join("types/TShips.txt.x3c.bak");
        std::fs::write(&backup, b"user original").unwrap();

        let mut log = open_log(&settings);
        log.record_renamed(&slot, &backup).unwrap();
        log.record_written(&slot, crate::utils::fingerprint(b"written by tool")).unwrap();
        let log = open_log(&settings);
        std::fs::write(&slot, b"user update").unwrap();

        let mut resolver = Resolver::new(&settings);
        let hit = found(resolver.resolve(&"types/TShips.txt".into(), &log).unwrap());
        assert_eq!(hit.bytes, b"user update");
        assert_eq!(hit.source.physical_path, slot);
    }

    #[test]
    fn test_override_paths_use_plain_names() {
        let (dir, settings) = setup();
        let root = Utf8PathBuf::from_path_buf(dir.path().join("src")).unwrap();
        std::fs::create_dir_all(root.join("types")).unwrap();
        std::fs::create_dir_all(root.join("t")).unwrap();
        std::fs::write(root.join("types/TShips.pck"), b"").unwrap();
        std::fs::write(root.join("types/TShips.txt"), b"").unwrap();
        std::fs::write(root.join("t/0001-L044.pck"), b"").unwrap();

        let resolver = Resolver::new(&settings.with_override_dir(&root));
        let paths: Vec<String> = resolver
            .override_virtual_paths()
            .iter()
            .map(|p| p.as_str().to_string())
            .collect();
        assert_eq!(paths, vec!["t/0001-L044.xml", "types/TShips.txt"]);
    }
}
